//! Off-thread image decoding with last-write-wins acceptance.
//!
//! Every import request gets an [`ImportTicket`] from a monotonically
//! increasing counter. Decoding runs on tokio's blocking pool, so several
//! requests may be in flight at once and finish in any order. A finished
//! result is applied only if its ticket is newer than every ticket accepted
//! before it; a slow, superseded decode is discarded.

use super::{decode, sample, ImportError, ImportPlan, Raster};

/// Generation number of one import request. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportTicket(u64);

impl ImportTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// A decoded and sampled image, ready for color assignment.
#[derive(Debug, Clone)]
pub struct SampledImage {
    pub ticket: ImportTicket,
    pub raster: Raster,
    pub rows: usize,
    pub columns: usize,
    pub source_width: u32,
    pub source_height: u32,
}

/// Issues tickets and decides which finished imports may be applied.
#[derive(Debug, Default)]
pub struct ImportScheduler {
    issued: u64,
    accepted: Option<ImportTicket>,
}

impl ImportScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new import request.
    pub fn issue(&mut self) -> ImportTicket {
        self.issued += 1;
        ImportTicket(self.issued)
    }

    /// Claim the right to apply a finished import.
    ///
    /// Returns true iff `ticket` is newer than every previously accepted one.
    pub fn accept(&mut self, ticket: ImportTicket) -> bool {
        match self.accepted {
            Some(last) if ticket <= last => {
                log::debug!("discarding stale import {} (already applied {})", ticket.0, last.0);
                false
            }
            _ => {
                self.accepted = Some(ticket);
                true
            }
        }
    }

    /// The most recently issued ticket, if any.
    pub fn latest(&self) -> Option<ImportTicket> {
        (self.issued > 0).then_some(ImportTicket(self.issued))
    }

    /// Decode `bytes` and sample them per `plan` on the blocking pool.
    pub async fn decode_and_sample(
        ticket: ImportTicket,
        bytes: Vec<u8>,
        plan: ImportPlan,
    ) -> Result<SampledImage, ImportError> {
        tokio::task::spawn_blocking(move || decode_and_sample_now(ticket, &bytes, &plan))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))?
    }
}

/// Synchronous body of [`ImportScheduler::decode_and_sample`].
pub fn decode_and_sample_now(ticket: ImportTicket, bytes: &[u8], plan: &ImportPlan) -> Result<SampledImage, ImportError> {
    let image = decode(bytes)?;
    let (source_width, source_height) = (image.width(), image.height());
    let (rows, columns) = plan.dimensions(source_width, source_height);
    log::info!("sampling {}x{} image to {}x{} cells", source_width, source_height, rows, columns);
    let raster = sample(&image, rows, columns, plan.alpha_threshold);
    Ok(SampledImage { ticket, raster, rows, columns, source_width, source_height })
}
