//! Concurrent task execution in dependency order.
//!
//! A task becomes ready once all its dependencies completed. Ready tasks with
//! an action run on the blocking pool; skipped tasks and sentinels complete
//! immediately. After the first failure nothing new is scheduled; tasks
//! already running finish and their results are discarded.

use super::{
    context::StartupParameters,
    mode::TaskPhase,
    task::{TaskConfig, TaskId},
};
use crate::{
    error::{Error, PackagingError, Result},
    graph::FixedDag,
};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};
use tokio::task::JoinSet;

pub(crate) async fn run(
    dag: &FixedDag<TaskId>,
    configs: &BTreeMap<TaskId, TaskConfig>,
    params: Arc<StartupParameters>,
) -> Result<()> {
    let mode = params.mode();
    let verbose = params.env().verbose();

    let mut pending: HashMap<TaskId, usize> = dag
        .nodes()
        .map(|task| (task, dag.tails_of(task).len()))
        .collect();
    let mut ready: VecDeque<TaskId> = dag
        .topological_order()
        .iter()
        .copied()
        .filter(|task| pending.get(task) == Some(&0))
        .collect();

    let mut running: JoinSet<(TaskId, std::result::Result<Result<()>, String>)> = JoinSet::new();
    let mut failure: Option<Error> = None;

    loop {
        while failure.is_none()
            && let Some(task) = ready.pop_front()
        {
            let action = configs.get(&task).and_then(|config| config.action()).cloned();
            let runs = mode.runs(TaskPhase::of(task, dag));
            match action {
                Some(action) if runs => {
                    if verbose {
                        log::info!("Running task {task}");
                    } else {
                        log::debug!("Running task {task}");
                    }
                    let params = Arc::clone(&params);
                    running.spawn(async move {
                        let joined =
                            tokio::task::spawn_blocking(move || params.dispatch(task, &action))
                                .await
                                .map_err(|e| e.to_string());
                        (task, joined)
                    });
                }
                Some(_) => {
                    log::debug!("Skipping task {task} in {mode} mode");
                    complete(task, dag, &mut pending, &mut ready);
                }
                None => complete(task, dag, &mut pending, &mut ready),
            }
        }

        let Some(joined) = running.join_next().await else {
            break;
        };
        let (task, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                failure.get_or_insert(
                    PackagingError::TaskPanicked {
                        task: "unknown".to_string(),
                        reason: e.to_string(),
                    }
                    .into(),
                );
                continue;
            }
        };
        match outcome {
            Ok(Ok(())) => {
                log::debug!("Task {task} completed");
                complete(task, dag, &mut pending, &mut ready);
            }
            Ok(Err(source)) => {
                log::debug!("Task {task} failed: {source}");
                if failure.is_none() {
                    failure = Some(
                        PackagingError::TaskFailed {
                            task: task.to_string(),
                            source: Box::new(source),
                        }
                        .into(),
                    );
                }
            }
            Err(reason) => {
                if failure.is_none() {
                    failure = Some(
                        PackagingError::TaskPanicked {
                            task: task.to_string(),
                            reason,
                        }
                        .into(),
                    );
                }
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn complete(
    task: TaskId,
    dag: &FixedDag<TaskId>,
    pending: &mut HashMap<TaskId, usize>,
    ready: &mut VecDeque<TaskId>,
) {
    for head in dag.heads_of(task) {
        if let Some(count) = pending.get_mut(&head) {
            *count -= 1;
            if *count == 0 {
                ready.push_back(head);
            }
        }
    }
}
