//! Runs a patch on a background thread and hands back one result.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::error::{Error, Result};
use crate::patchset::PatchSet;
use crate::patcher::{PatchReport, PatchRequest, Patcher};
use crate::resize::ImageResizer;

pub struct PatchWorker {
    handle: JoinHandle<()>,
    result: Receiver<Result<PatchReport>>,
}

impl PatchWorker {
    /// Start patching `request` on a new thread.
    pub fn spawn(
        patch_set: Arc<PatchSet>,
        resizer: Arc<dyn ImageResizer>,
        request: PatchRequest,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("patch-worker".to_string())
            .spawn(move || {
                let result = Patcher::new(&patch_set, resizer.as_ref()).run(&request);
                if let Err(e) = &result {
                    error!("Patch failed: {}", e);
                }
                // receiver may be gone if the caller stopped waiting
                let _ = tx.send(result);
            })?;
        Ok(Self { handle, result: rx })
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Result<PatchReport> {
        let result = self.result.recv();
        // a panicking worker drops its sender, which surfaces below
        let _ = self.handle.join();
        result.unwrap_or_else(|_| {
            Err(Error::Io(io::Error::other(
                "patch worker exited without reporting a result",
            )))
        })
    }
}
