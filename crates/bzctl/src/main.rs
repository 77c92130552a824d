// Файл: crates/bzctl/src/main.rs
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use barrel_index::barrel::BarrelStore;
use barrel_index::corpus::{default_extensions, discover};
use barrel_index::forward::ForwardIndex;
use barrel_index::inverted::InvertedIndex;
use barrel_index::lexicon::term_counts;
use barrel_index::mapping::BarrelMapping;
use barrel_index::pipeline::{build_index, BuildOptions};
use barrel_index::{
    IndexLayout, Lexicon, NormalizerKind, PartitionScheme, QueryOutcome, QueryResolver,
};

#[derive(Parser)]
#[command(version, about = "Barrel index control: build stages and one-shot search")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum Normalizer {
    Ascii,
    Folded,
}

impl From<Normalizer> for NormalizerKind {
    fn from(n: Normalizer) -> Self {
        match n {
            Normalizer::Ascii => NormalizerKind::Ascii,
            Normalizer::Folded => NormalizerKind::Folded,
        }
    }
}

/// Общие параметры токенизации
#[derive(Args)]
struct TextOpts {
    #[arg(long, value_enum, default_value = "ascii")]
    normalizer: Normalizer,
    /// Расширения файлов корпуса (по умолчанию txt, json, csv, ...)
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

impl TextOpts {
    fn extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            default_extensions()
        } else {
            self.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Построить lexicon.json по корпусу
    Lexicon {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "lexicon.json")]
        out: PathBuf,
        /// Напечатать N самых частых термов
        #[arg(long, default_value_t = 20)]
        top: usize,
        #[command(flatten)]
        text: TextOpts,
    },
    /// Построить forward_index.json
    Forward {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "lexicon.json")]
        lexicon: PathBuf,
        #[arg(long, default_value = "forward_index.json")]
        out: PathBuf,
        #[arg(long, default_value_t = false)]
        sequential: bool,
        #[command(flatten)]
        text: TextOpts,
    },
    /// Построить inverted_index.json из прямого индекса
    Inverted {
        #[arg(long, default_value = "forward_index.json")]
        forward: PathBuf,
        #[arg(long, default_value = "inverted_index.json")]
        out: PathBuf,
    },
    /// Построить barrel_mapping.json
    Mapping {
        #[arg(long, default_value = "lexicon.json")]
        lexicon: PathBuf,
        #[arg(long, default_value = "barrel_mapping.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 32)]
        partitions: u32,
    },
    /// Разложить инвертированный индекс по баррелям
    Barrels {
        #[arg(long, default_value = "inverted_index.json")]
        inverted: PathBuf,
        #[arg(long, default_value = "lexicon.json")]
        lexicon: PathBuf,
        #[arg(long, default_value = "barrel_mapping.json")]
        mapping: PathBuf,
        #[arg(long, default_value = "barrels")]
        out_dir: PathBuf,
        /// Должно совпадать с тем, что передавали в `mapping`
        #[arg(long, default_value_t = 32)]
        partitions: u32,
        /// Тот же, что при сборке лексикона; попадает в manifest.json
        #[arg(long, value_enum)]
        normalizer: Normalizer,
    },
    /// Полная сборка: корпус -> все артефакты
    Build {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "index")]
        index: PathBuf,
        #[arg(long, default_value_t = 32)]
        partitions: u32,
        #[arg(long, default_value_t = false)]
        sequential: bool,
        #[command(flatten)]
        text: TextOpts,
    },
    /// Поиск одного терма (читает ровно один баррель)
    Search {
        #[arg(long, default_value = "index")]
        index: PathBuf,
        #[arg(long)]
        q: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Lexicon {
            corpus,
            out,
            top,
            text,
        } => {
            let normalizer: NormalizerKind = text.normalizer.into();
            let docs = discover(&corpus, &text.extensions())?;
            let lex = Lexicon::from_corpus(&docs, normalizer)?;
            lex.save(&out)?;

            let mut counts: Vec<(String, u64)> =
                term_counts(&docs, normalizer).into_iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            println!("{} terms -> {}", lex.len(), out.display());
            for (term, n) in counts.iter().take(top) {
                println!("{term}\t{n}");
            }
        }
        Cmd::Forward {
            corpus,
            lexicon,
            out,
            sequential,
            text,
        } => {
            let lex = Lexicon::load(&lexicon)?;
            let docs = discover(&corpus, &text.extensions())?;
            let fwd = ForwardIndex::build(&docs, &lex, text.normalizer.into(), !sequential);
            fwd.save(&out)?;
            println!("{} documents -> {}", fwd.len(), out.display());
        }
        Cmd::Inverted { forward, out } => {
            let fwd = ForwardIndex::load(&forward)?;
            let inv = InvertedIndex::from_forward(&fwd);
            inv.save(&out)?;
            println!(
                "{} terms, {} postings -> {}",
                inv.term_count(),
                inv.posting_count(),
                out.display()
            );
        }
        Cmd::Mapping {
            lexicon,
            out,
            partitions,
        } => {
            let scheme = PartitionScheme::with_partitions(partitions)?;
            let lex = Lexicon::load(&lexicon)?;
            let mapping = BarrelMapping::from_lexicon(&lex, &scheme);
            mapping.save(&out)?;
            println!(
                "{} terms over {} barrels -> {}",
                mapping.len(),
                scheme.partitions(),
                out.display()
            );
        }
        Cmd::Barrels {
            inverted,
            lexicon,
            mapping,
            out_dir,
            partitions,
            normalizer,
        } => {
            let scheme = PartitionScheme::with_partitions(partitions)?;
            let lex = Lexicon::load(&lexicon)?;
            let inv = InvertedIndex::load(&inverted)?;
            let map = BarrelMapping::load(&mapping, &scheme)?;
            let store = BarrelStore::assemble(&inv, &lex, &map, scheme, normalizer.into())?;
            let report = store.persist(&out_dir)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_complete() {
                anyhow::bail!(
                    "{} barrel(s) failed to persist: {:?}",
                    report.failed.len(),
                    report.failed_ids()
                );
            }
        }
        Cmd::Build {
            corpus,
            index,
            partitions,
            sequential,
            text,
        } => {
            let opts = BuildOptions {
                scheme: PartitionScheme::with_partitions(partitions)?,
                normalizer: text.normalizer.into(),
                extensions: text.extensions(),
                parallel: !sequential,
            };
            let layout = IndexLayout::new(&index);
            let report = build_index(&corpus, &layout, &opts)
                .with_context(|| format!("build index from {}", corpus.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.barrels.is_complete() {
                anyhow::bail!(
                    "{} barrel(s) failed to persist",
                    report.barrels.failed.len()
                );
            }
        }
        Cmd::Search { index, q } => {
            let resolver = QueryResolver::open(&IndexLayout::new(&index))
                .with_context(|| format!("open index at {}", index.display()))?;
            let started = Instant::now();
            let outcome = resolver.resolve(&q)?;
            let elapsed_us = started.elapsed().as_micros();

            match &outcome {
                QueryOutcome::EmptyQuery => println!("empty query"),
                QueryOutcome::NotIndexed { term } => println!("{term}: not in lexicon"),
                QueryOutcome::NoPostings {
                    term,
                    term_id,
                    partition,
                } => println!("{term} (id {term_id}, barrel {partition}): no postings"),
                QueryOutcome::Found {
                    term,
                    term_id,
                    partition,
                    postings,
                } => {
                    println!(
                        "{term} (id {term_id}, barrel {partition}): {} document(s)",
                        postings.len()
                    );
                    for p in postings {
                        println!("{}\t{}", p.doc_id, p.freq);
                    }
                }
            }
            eprintln!("elapsed_us={elapsed_us}");
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
