// crates/broker/src/lookup/executor.rs
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::lookup::types::BatchItem;

/// Вход для задачи по одному терму.
#[derive(Debug, Clone)]
pub struct LookupTask {
    /// Позиция в исходном пакете
    pub index: usize,
    pub query: String,
}

#[derive(Debug)]
pub struct LookupTaskOutput {
    pub index: usize,
    pub item: BatchItem,
}

impl LookupTaskOutput {
    pub fn cancelled(task: LookupTask) -> Self {
        Self {
            index: task.index,
            item: BatchItem::cancelled(task.query),
        }
    }
}

/// Параллельный исполнитель с семафором + дедлайном.
pub struct ParallelExecutor {
    sem: Arc<Semaphore>,
}

impl ParallelExecutor {
    pub fn new(parallelism: usize) -> Self {
        Self {
            sem: Arc::new(Semaphore::new(parallelism.max(1))),
        }
    }

    /// Запускает все `inputs` c дедлайном `deadline` и общей отменой `root_ct`.
    /// Задачи, не успевшие к дедлайну, возвращаются как `cancelled`.
    ///
    /// Возвращает `(parts, deadline_hit, saturated_sem)`; `parts` отсортированы по `index`.
    pub async fn run_all<F, Fut>(
        &self,
        root_ct: CancellationToken,
        inputs: Vec<LookupTask>,
        lookup_fn: F,
        deadline: Option<Duration>,
    ) -> (Vec<LookupTaskOutput>, bool, usize)
    where
        F: Fn(LookupTask, CancellationToken) -> Fut + Send + Sync + 'static + Clone,
        Fut: Future<Output = LookupTaskOutput> + Send + 'static,
    {
        if inputs.is_empty() {
            return (Vec::new(), false, 0);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<LookupTaskOutput>();

        // Отменяется либо снаружи (root_ct), либо по дедлайну.
        let merged_ct = root_ct.child_token();
        let deadline_hit = Arc::new(AtomicBool::new(false));

        let timer = deadline.map(|dl| {
            let merged_ct = merged_ct.clone();
            let dl_flag = deadline_hit.clone();
            tokio::spawn(async move {
                tokio::time::sleep(dl).await;
                dl_flag.store(true, Ordering::Relaxed);
                merged_ct.cancel();
            })
        });

        // Сколько раз try_acquire не дал permit сразу
        let mut saturated_sem = 0usize;

        for task in inputs {
            let txc = tx.clone();

            let permit = match self.sem.clone().try_acquire_owned() {
                Ok(p) => p,
                Err(_) => {
                    saturated_sem += 1;
                    tokio::select! {
                        p = self.sem.clone().acquire_owned() => match p {
                            Ok(p) => p,
                            Err(_) => {
                                // семафор закрыт
                                let _ = txc.send(LookupTaskOutput::cancelled(task));
                                continue;
                            }
                        },
                        _ = merged_ct.cancelled() => {
                            let _ = txc.send(LookupTaskOutput::cancelled(task));
                            continue;
                        }
                    }
                }
            };

            if merged_ct.is_cancelled() {
                let _ = txc.send(LookupTaskOutput::cancelled(task));
                continue;
            }

            let lookup_fn_c = lookup_fn.clone();
            let task_ct = merged_ct.child_token();
            tokio::spawn(async move {
                let _g = permit;
                let out = tokio::select! {
                    out = lookup_fn_c(task.clone(), task_ct.clone()) => out,
                    _ = task_ct.cancelled() => LookupTaskOutput::cancelled(task),
                };
                let _ = txc.send(out);
            });
        }

        drop(tx); // закрываем канал: сигнал сборщику

        let mut parts: Vec<LookupTaskOutput> = Vec::new();
        while let Some(p) = rx.recv().await {
            parts.push(p);
        }
        if let Some(t) = timer {
            t.abort();
        }
        parts.sort_by_key(|p| p.index);

        (parts, deadline_hit.load(Ordering::Relaxed), saturated_sem)
    }
}
