use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};

use crate::model::RenderManifest;

use super::pipeline::{RenderRequest, render};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Progress { step: usize, message: String },
    Finished { success: bool, message: String, missing: Vec<String> },
}

pub struct RenderWorker {
    pub events: Receiver<RenderEvent>,
    handle: JoinHandle<Option<RenderManifest>>,
}

impl RenderWorker {
    pub fn spawn(request: RenderRequest) -> Result<Self> {
        let (sender, events) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || run_job(&request, &sender))
            .context("failed to start render worker thread")?;
        Ok(Self { events, handle })
    }

    pub fn join(self) -> Result<Option<RenderManifest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("render worker thread panicked"))
    }
}

// A dropped receiver only means nobody is listening; the render still completes.
fn run_job(request: &RenderRequest, sender: &Sender<RenderEvent>) -> Option<RenderManifest> {
    let mut progress = |step: usize, message: &str| {
        let _ = sender.send(RenderEvent::Progress {
            step,
            message: message.to_string(),
        });
    };

    let (finished, manifest) = match render(request, &mut progress) {
        Ok(manifest) => (
            RenderEvent::Finished {
                success: true,
                message: format!("saved {}", request.output.display()),
                missing: manifest.missing.clone(),
            },
            Some(manifest),
        ),
        Err(err) => (
            RenderEvent::Finished {
                success: false,
                message: format!("{err:#}"),
                missing: Vec::new(),
            },
            None,
        ),
    };
    let _ = sender.send(finished);
    manifest
}
