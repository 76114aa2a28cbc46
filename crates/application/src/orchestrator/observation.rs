use tokio::time::Instant;

use super::*;

pub(super) enum Observation {
    Terminal(WorkflowExecution),
    DeadlineExceeded,
    DescribeFailed(AppError),
}

impl AccessRequestOrchestrator {
    /// Describes the execution at a fixed interval until it is terminal or
    /// the observation deadline passes.
    pub(super) async fn observe(
        &self,
        request_id: RequestId,
        execution_id: &ExecutionId,
    ) -> Observation {
        let deadline = self
            .observation
            .max_wait
            .map(|max_wait| Instant::now() + max_wait);

        loop {
            match self.engine.describe_execution(execution_id).await {
                Ok(execution) if execution.status.is_terminal() => {
                    return Observation::Terminal(execution);
                }
                Ok(_) => {}
                Err(describe_error) => {
                    error!(
                        request_id = %request_id,
                        execution_id = %execution_id,
                        error = %describe_error,
                        "failed to describe approval workflow execution"
                    );
                    return Observation::DescribeFailed(describe_error);
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.stop_after_deadline(request_id, execution_id).await;
                        return Observation::DeadlineExceeded;
                    }
                    self.observation.poll_interval.min(deadline - now)
                }
                None => self.observation.poll_interval,
            };

            tokio::time::sleep(pause).await;
        }
    }

    async fn stop_after_deadline(&self, request_id: RequestId, execution_id: &ExecutionId) {
        warn!(
            request_id = %request_id,
            execution_id = %execution_id,
            "approval workflow execution exceeded observation deadline, stopping it"
        );

        if let Err(stop_error) = self
            .engine
            .stop_execution(execution_id, "observation deadline exceeded")
            .await
        {
            warn!(
                request_id = %request_id,
                execution_id = %execution_id,
                error = %stop_error,
                "failed to stop approval workflow execution"
            );
        }
    }
}
