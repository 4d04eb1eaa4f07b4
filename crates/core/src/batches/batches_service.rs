use log::{info, warn};
use std::sync::Arc;

use crate::allocations::AllocationRepositoryTrait;
use crate::batches::batches_errors::BatchError;
use crate::batches::batches_model::SendResult;
use crate::batches::{BatchHistoryRepositoryTrait, SendServiceTrait};
use crate::export::{CliInvokerTrait, FileGeneratorTrait};
use crate::{Error, Result};
use async_trait::async_trait;

/// Send engine: atomically advances the batch cursor, exports the covered
/// allocations, and hands them to the external CLI.
///
/// The batch-history unique constraints are the only mutual-exclusion
/// mechanism; there is deliberately no in-process lock here, so the protocol
/// stays correct across replicas.
pub struct SendService {
    batch_history_repository: Arc<dyn BatchHistoryRepositoryTrait>,
    allocation_repository: Arc<dyn AllocationRepositoryTrait>,
    file_generator: Arc<dyn FileGeneratorTrait>,
    cli_invoker: Arc<dyn CliInvokerTrait>,
    file_cleanup_enabled: bool,
}

impl SendService {
    pub fn new(
        batch_history_repository: Arc<dyn BatchHistoryRepositoryTrait>,
        allocation_repository: Arc<dyn AllocationRepositoryTrait>,
        file_generator: Arc<dyn FileGeneratorTrait>,
        cli_invoker: Arc<dyn CliInvokerTrait>,
        file_cleanup_enabled: bool,
    ) -> Self {
        Self {
            batch_history_repository,
            allocation_repository,
            file_generator,
            cli_invoker,
            file_cleanup_enabled,
        }
    }
}

#[async_trait]
impl SendServiceTrait for SendService {
    async fn send_batch(&self) -> Result<SendResult> {
        info!("starting batch send");

        let window = match self.batch_history_repository.try_claim_window().await {
            Ok(window) => window,
            Err(err @ Error::Batch(BatchError::WindowContended(_))) => {
                if let Ok(Some(max_start)) = self.batch_history_repository.get_max_start_time() {
                    warn!(
                        "batch window contended; latest committed start_time is {}",
                        max_start
                    );
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        info!(
            "claimed batch window [{}, {})",
            window.previous_start_time, window.start_time
        );

        let allocations = self
            .allocation_repository
            .select_for_window(window.previous_start_time, window.start_time)?;

        if allocations.is_empty() {
            // The window is still recorded; future windows keep progressing.
            info!("no allocations in claimed window");
            return Ok(SendResult::empty());
        }

        info!("selected {} allocations for send", allocations.len());

        // From here on the window is consumed: a failure leaves its
        // allocations outside all future windows. Recovery is operational.
        let file_name = self.file_generator.generate(&allocations)?;

        if let Err(err) = self.cli_invoker.invoke(&file_name).await {
            return Ok(SendResult::cli_error(
                allocations.len(),
                file_name,
                format!("CLI invocation failed: {}", err),
            ));
        }

        if self.file_cleanup_enabled {
            if let Err(err) = self.file_generator.cleanup(&file_name) {
                warn!("file cleanup failed for {}: {}", file_name, err);
            }
        }

        info!(
            "batch send completed: processed={} file={}",
            allocations.len(),
            file_name
        );

        Ok(SendResult::success(allocations.len(), file_name))
    }
}
