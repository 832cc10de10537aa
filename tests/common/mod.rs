//! Shared helpers for engine integration tests.
//!
//! [`Scripted`] is an [`OperationExecutor`] whose per-phase behavior is set
//! up front; it records every phase it is asked to run.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pf_core::Error;
use pf_pipeline::{FileContext, OperationExecutor, OperationOutput, PhaseRunner, ValidatedPolicy};
use pf_probe::{AudioTrack, MediaInfo, VideoTrack};
use pf_rules::{OnErrorMode, Operations, PhaseDefinition};

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Modify,
    NoChange,
    Fail,
}

#[derive(Clone, Default)]
pub struct Scripted {
    behaviors: HashMap<String, Behavior>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, phase: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(phase.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Phases executed so far, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperationExecutor for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(
        &self,
        phase: &str,
        _operations: &Operations,
        _ctx: &FileContext,
    ) -> pf_core::Result<OperationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(phase.to_string());
        match self.behaviors.get(phase).copied().unwrap_or(Behavior::Modify) {
            Behavior::Modify => Ok(OperationOutput::modified()),
            Behavior::NoChange => Ok(OperationOutput::unchanged()),
            Behavior::Fail => Err(Error::operation(phase, "intentional failure")),
        }
    }
}

pub fn runner(phases: Vec<PhaseDefinition>, default: OnErrorMode, exec: &Scripted) -> PhaseRunner {
    let policy = ValidatedPolicy::new(phases, default).unwrap();
    PhaseRunner::new(Arc::new(policy), Arc::new(exec.clone()))
}

/// A 1080p file with the given video codec and one English audio track.
pub fn media(codec: &str) -> FileContext {
    FileContext::from_media_info(
        MediaInfo::new("/media/movie.mkv")
            .with_container("matroska,webm")
            .with_file_size(4 * 1024 * 1024 * 1024)
            .with_duration_secs(5400.0)
            .with_video(VideoTrack::new(codec, 1920, 1080))
            .with_audio(AudioTrack::new("truehd").with_language("eng")),
    )
}
