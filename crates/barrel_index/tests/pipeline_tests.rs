use std::collections::BTreeSet;

use barrel_index::barrel::load_barrel;
use barrel_index::forward::ForwardIndex;
use barrel_index::inverted::InvertedIndex;
use barrel_index::mapping::BarrelMapping;
use barrel_index::pipeline::{build_index, BuildOptions};
use barrel_index::{IndexError, IndexLayout, Lexicon, PartitionScheme};

mod helpers;
use helpers::{index_dir, read_bytes, scenario_a, write_corpus};

#[test]
fn scenario_a_builds_expected_postings() {
    let (tmp, corpus) = scenario_a();
    let layout = IndexLayout::new(index_dir(&tmp));
    let report = build_index(&corpus, &layout, &BuildOptions::default()).unwrap();

    assert_eq!(report.documents, 2);
    assert_eq!(report.terms, 3);
    assert!(report.barrels.is_complete());

    let lex = Lexicon::load(&layout.lexicon).unwrap();
    let terms: BTreeSet<_> = lex.iter().map(|(_, t)| t.to_string()).collect();
    assert_eq!(
        terms,
        ["fast", "spread", "virus"].iter().map(|s| s.to_string()).collect()
    );

    let inv = InvertedIndex::load(&layout.inverted).unwrap();
    let spread = inv.postings(lex.term_id("spread").unwrap()).unwrap();
    assert_eq!(spread.len(), 2);
    assert_eq!(spread[&1], 1);
    assert_eq!(spread[&2], 1);
    let virus = inv.postings(lex.term_id("virus").unwrap()).unwrap();
    assert_eq!(virus[&1], 2);
    assert!(!virus.contains_key(&2));

    let fwd = ForwardIndex::load(&layout.forward).unwrap();
    assert_eq!(fwd.len(), 2);
    assert!(fwd.documents[0].file.ends_with("a.txt"));
}

#[test]
fn barrels_cover_mapping_exactly_once() {
    let (tmp, corpus) = write_corpus(&[
        ("one.txt", "apple banana cherry delta echo"),
        ("two.md", "foxtrot golf hotel india juliet 42"),
        ("sub/three.log", "kilo lima mike november oscar papa quebec"),
        ("sub/four.csv", "romeo,sierra,tango,uniform,victor,whiskey,xray,yankee,zulu"),
    ]);
    let layout = IndexLayout::new(index_dir(&tmp));
    let opts = BuildOptions::default();
    build_index(&corpus, &layout, &opts).unwrap();

    let mapping = BarrelMapping::load(&layout.mapping, &opts.scheme).unwrap();
    let mut seen = BTreeSet::new();
    for id in 0..opts.scheme.partitions() {
        let barrel = load_barrel(&layout.barrels_dir, id, None).unwrap();
        for term_id in barrel.keys() {
            assert!(seen.insert(*term_id), "term {term_id} in two barrels");
            assert_eq!(mapping.get(*term_id), Some(id));
        }
    }
    let mapped: BTreeSet<_> = mapping.iter().map(|(t, _)| t).collect();
    assert_eq!(seen, mapped);
}

#[test]
fn rebuild_is_idempotent() {
    let (tmp, corpus) = write_corpus(&[
        ("z.txt", "the quick brown fox"),
        ("a.txt", "jumps over the lazy dog"),
        ("m/n.txt", "The Dog sleeps; the fox runs."),
    ]);
    let first = IndexLayout::new(tmp.path().join("first"));
    let second = IndexLayout::new(tmp.path().join("second"));
    build_index(&corpus, &first, &BuildOptions::default()).unwrap();
    build_index(
        &corpus,
        &second,
        &BuildOptions {
            parallel: false,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(read_bytes(&first.lexicon), read_bytes(&second.lexicon));
    assert_eq!(read_bytes(&first.inverted), read_bytes(&second.inverted));
    assert_eq!(read_bytes(&first.mapping), read_bytes(&second.mapping));
    for id in 0..32 {
        assert_eq!(
            read_bytes(&first.barrel_path(id)),
            read_bytes(&second.barrel_path(id))
        );
    }
    let f1 = ForwardIndex::load(&first.forward).unwrap();
    let f2 = ForwardIndex::load(&second.forward).unwrap();
    assert_eq!(
        f1.documents.iter().map(|d| (&d.file, &d.terms)).collect::<Vec<_>>(),
        f2.documents.iter().map(|d| (&d.file, &d.terms)).collect::<Vec<_>>()
    );
}

#[test]
fn empty_corpus_halts_with_empty_lexicon() {
    let (tmp, corpus) = write_corpus(&[("blank.txt", "  ... !!! "), ("pic.png", "binary")]);
    let layout = IndexLayout::new(index_dir(&tmp));
    let err = build_index(&corpus, &layout, &BuildOptions::default()).unwrap_err();
    assert!(matches!(err, IndexError::EmptyLexicon));
    assert!(!layout.inverted.exists());
    assert!(!layout.barrels_dir.exists());
}

#[test]
fn configurable_partition_count() {
    let (tmp, corpus) = scenario_a();
    let layout = IndexLayout::new(index_dir(&tmp));
    let opts = BuildOptions {
        scheme: PartitionScheme::with_partitions(8).unwrap(),
        ..Default::default()
    };
    let report = build_index(&corpus, &layout, &opts).unwrap();
    assert_eq!(report.barrels.written.len(), 8);
    assert!(layout.barrel_path(7).exists());
    assert!(!layout.barrel_path(8).exists());
}
