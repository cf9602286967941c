//! Pipeline coordination for podforge.
//!
//! Runs retrieval, script generation, parsing, speech synthesis and assembly in
//! sequence under one overall deadline.

use crate::audio::{assemble, AssembledTrack};
use crate::config::{Prompts, Settings};
use crate::context::ContextRetriever;
use crate::error::{PodforgeError, Result};
use crate::knowledge::{KnowledgeClient, KnowledgeStore};
use crate::script::{parse_script, ChatScriptGenerator, Line, ScriptGenerator, VoiceMap};
use crate::speech::{synthesize_lines, OpenAiSpeech, SkippedLine, SpeechSynthesizer};
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of a finished podcast run.
#[derive(Debug)]
pub struct PodcastOutput {
    pub track: AssembledTrack,
    /// Every recognized script line, including ones that produced no audio.
    pub lines: Vec<Line>,
    pub skipped: Vec<SkippedLine>,
    /// Non-blank script lines without a speaker label.
    pub discarded: usize,
}

/// The podcast pipeline.
pub struct Pipeline {
    settings: Settings,
    store: Arc<dyn KnowledgeStore>,
    retriever: ContextRetriever,
    generator: Arc<dyn ScriptGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voices: VoiceMap,
}

impl Pipeline {
    /// Create a pipeline talking to the configured HTTP services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store: Arc<dyn KnowledgeStore> =
            Arc::new(KnowledgeClient::new(&settings.knowledge)?);
        let generator: Arc<dyn ScriptGenerator> =
            Arc::new(ChatScriptGenerator::new(&settings.script, prompts)?);
        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(OpenAiSpeech::new(&settings.speech)?);

        info!(
            "Using {} for scripts, {} for speech",
            settings.script.model, settings.speech.model
        );

        Ok(Self::with_components(settings, store, generator, synthesizer))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn ScriptGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let retriever = ContextRetriever::new(store.clone(), settings.knowledge.max_context_chars);
        let voices = VoiceMap::from(&settings.speech);
        Self {
            settings,
            store,
            retriever,
            generator,
            synthesizer,
            voices,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create an empty collection for an upcoming podcast.
    #[instrument(skip(self))]
    pub async fn create_podcast(&self, topic: &str, collection: &str) -> Result<()> {
        require_non_empty("topic", topic)?;
        require_non_empty("collection", collection)?;
        self.store.create_collection(collection, topic).await?;
        info!("Created collection {}", collection);
        Ok(())
    }

    /// Add a document to a collection.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn upload_document(&self, collection: &str, text: &str) -> Result<()> {
        require_non_empty("collection", collection)?;
        require_non_empty("document", text)?;
        self.store.upload_document(collection, text).await
    }

    /// Produce a podcast about `topic` from an existing collection.
    #[instrument(skip(self))]
    pub async fn finish_podcast(&self, topic: &str, collection: &str) -> Result<PodcastOutput> {
        require_non_empty("topic", topic)?;
        require_non_empty("collection", collection)?;
        let deadline = Instant::now() + self.settings.deadline();

        let context = timeout_at(deadline, self.retriever.retrieve(topic, collection))
            .await
            .map_err(|_| PodforgeError::Timeout("retrieval"))??;

        let script = timeout_at(deadline, self.generator.generate(topic, &context))
            .await
            .map_err(|_| PodforgeError::Timeout("generation"))??;

        let parsed = parse_script(&script, &self.voices);
        if parsed.is_empty() {
            return Err(PodforgeError::EmptyScript("empty script".to_string()));
        }
        info!(
            "Parsed {} lines ({} discarded)",
            parsed.lines.len(),
            parsed.discarded
        );

        let report = synthesize_lines(
            self.synthesizer.as_ref(),
            &parsed.lines,
            self.settings.speech.max_concurrent,
            Some(deadline),
        )
        .await
        .into_result()?;

        let skipped = report.skipped;
        let clips = report.clips;
        let track = tokio::task::spawn_blocking(move || assemble(clips))
            .await
            .map_err(|e| PodforgeError::Assembly(e.to_string()))??;

        info!(
            "Podcast ready: {} segments, {:.1}s",
            track.segments.len(),
            track.duration_seconds()
        );

        Ok(PodcastOutput {
            track,
            lines: parsed.lines,
            skipped,
            discarded: parsed.discarded,
        })
    }

    /// One-shot run: ingest `document` into a temporary collection, produce the
    /// podcast, then drop the collection whatever the outcome.
    ///
    /// The delete is attempted even when creating the collection fails, since
    /// the service may have created it before erroring.
    #[instrument(skip(self, document), fields(document_len = document.len()))]
    pub async fn instant_podcast(&self, topic: &str, document: &str) -> Result<PodcastOutput> {
        require_non_empty("topic", topic)?;
        require_non_empty("document", document)?;

        let collection = Uuid::new_v4().to_string();
        let result = async {
            self.create_podcast(topic, &collection).await?;
            self.upload_document(&collection, document).await?;
            self.finish_podcast(topic, &collection).await
        }
        .await;

        if let Err(e) = self.store.delete_collection(&collection).await {
            warn!("Failed to delete collection {}: {}", collection, e);
        }

        result
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PodforgeError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::MemoryKnowledgeStore;
    use crate::speech::SkipReason;
    use crate::test_support::{wav_clip, wav_samples};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns a canned script and records the context it was given.
    struct FakeGenerator {
        script: Result<String>,
        delay: Duration,
        contexts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn ok(script: &str) -> Self {
            Self {
                script: Ok(script.to_string()),
                delay: Duration::ZERO,
                contexts: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: PodforgeError) -> Self {
            Self {
                script: Err(err),
                delay: Duration::ZERO,
                contexts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScriptGenerator for FakeGenerator {
        async fn generate(&self, _topic: &str, context: &str) -> Result<String> {
            self.contexts.lock().unwrap().push(context.to_string());
            tokio::time::sleep(self.delay).await;
            match &self.script {
                Ok(s) => Ok(s.clone()),
                Err(PodforgeError::EmptyScript(m)) => Err(PodforgeError::EmptyScript(m.clone())),
                Err(PodforgeError::GenerationStatus { status, body }) => {
                    Err(PodforgeError::GenerationStatus {
                        status: *status,
                        body: body.clone(),
                    })
                }
                Err(other) => Err(PodforgeError::Generation(other.to_string())),
            }
        }
    }

    /// One WAV clip per line: 100 frames of 1 for the host voice, 2 for the guest.
    /// Utterances containing "fail" error.
    #[derive(Default)]
    struct WavSynth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for WavSynth {
        async fn synthesize(&self, voice: &str, text: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fail") {
                return Err(PodforgeError::SpeechStatus {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let value = if voice == "alloy" { 1 } else { 2 };
            Ok(wav_clip(value, 100, 24_000, 1))
        }
    }

    async fn store_with(collection: &str, document: &str) -> Arc<MemoryKnowledgeStore> {
        let store = Arc::new(MemoryKnowledgeStore::new());
        store.create_collection(collection, "topic").await.unwrap();
        store.upload_document(collection, document).await.unwrap();
        store
    }

    fn pipeline(
        settings: Settings,
        store: Arc<MemoryKnowledgeStore>,
        generator: Arc<FakeGenerator>,
        synth: Arc<WavSynth>,
    ) -> Pipeline {
        Pipeline::with_components(settings, store, generator, synth)
    }

    #[tokio::test]
    async fn test_black_holes_end_to_end() {
        let document = "Black holes warp spacetime so strongly that light cannot escape.";
        let store = store_with("c1", document).await;
        let generator = Arc::new(FakeGenerator::ok(
            "Host: Welcome! Today: black holes. Guest: They warp spacetime.",
        ));
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(Settings::default(), store, generator.clone(), synth.clone());

        let output = pipeline.finish_podcast("black holes", "c1").await.unwrap();

        assert_eq!(
            generator.contexts.lock().unwrap().as_slice(),
            [document.to_string()]
        );
        assert_eq!(output.lines.len(), 2);
        assert_eq!(output.lines[0].voice, "alloy");
        assert_eq!(output.lines[0].utterance, "Welcome! Today: black holes.");
        assert_eq!(output.lines[1].voice, "echo");
        assert_eq!(output.lines[1].utterance, "They warp spacetime.");
        assert_eq!(output.track.segments, vec![0, 1]);
        assert!(output.skipped.is_empty());
        assert_eq!(synth.calls.load(Ordering::SeqCst), 2);

        let (_, samples) = wav_samples(&output.track.wav);
        assert_eq!(samples.len(), 200);
        assert!(samples[..100].iter().all(|s| *s == 1));
        assert!(samples[100..].iter().all(|s| *s == 2));
    }

    #[tokio::test]
    async fn test_context_truncated_before_generation() {
        let store = store_with("c1", &"a".repeat(50)).await;
        let generator = Arc::new(FakeGenerator::ok("Host: hi"));
        let mut settings = Settings::default();
        settings.knowledge.max_context_chars = 10;
        let pipeline = pipeline(settings, store, generator.clone(), Arc::new(WavSynth::default()));

        pipeline.finish_podcast("anything", "c1").await.unwrap();
        assert_eq!(generator.contexts.lock().unwrap()[0], format!("{} …", "a".repeat(10)));
    }

    #[tokio::test]
    async fn test_generation_failure_skips_synthesis() {
        let store = store_with("c1", "doc").await;
        let generator = Arc::new(FakeGenerator::failing(PodforgeError::EmptyScript(
            "no choices".to_string(),
        )));
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(Settings::default(), store, generator, synth.clone());

        let err = pipeline.finish_podcast("topic", "c1").await.unwrap_err();
        assert_eq!(err.stage(), "generation");
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unlabelled_script_is_empty() {
        let store = store_with("c1", "doc").await;
        let generator = Arc::new(FakeGenerator::ok("Just some prose.\nNo speakers here."));
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(Settings::default(), store, generator, synth.clone());

        let err = pipeline.finish_podcast("topic", "c1").await.unwrap_err();
        assert!(matches!(err, PodforgeError::EmptyScript(_)));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_middle_line_is_dropped() {
        let store = store_with("c1", "doc").await;
        let generator = Arc::new(FakeGenerator::ok(
            "Host: First.\nGuest: This will fail.\nHost: Third.\nstage directions",
        ));
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(Settings::default(), store, generator, synth);

        let output = pipeline.finish_podcast("topic", "c1").await.unwrap();
        assert_eq!(output.track.segments, vec![0, 2]);
        assert_eq!(output.lines.len(), 3);
        assert_eq!(output.discarded, 1);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].index, 1);
        assert!(matches!(output.skipped[0].reason, SkipReason::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_collection_is_retrieval_error() {
        let store = Arc::new(MemoryKnowledgeStore::new());
        let generator = Arc::new(FakeGenerator::ok("Host: hi"));
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(Settings::default(), store, generator.clone(), synth);

        let err = pipeline.finish_podcast("topic", "nope").await.unwrap_err();
        assert_eq!(err.stage(), "retrieval");
        assert!(generator.contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let store = store_with("c1", "doc").await;
        let mut generator = FakeGenerator::ok("Host: hi");
        generator.delay = Duration::from_secs(30);
        let mut settings = Settings::default();
        settings.pipeline.deadline_secs = 1;
        let synth = Arc::new(WavSynth::default());
        let pipeline = pipeline(settings, store, Arc::new(generator), synth);

        let err = pipeline.finish_podcast("topic", "c1").await.unwrap_err();
        assert!(matches!(err, PodforgeError::Timeout("generation")));
    }

    #[tokio::test]
    async fn test_instant_podcast_cleans_up_collection() {
        let store = Arc::new(MemoryKnowledgeStore::new());
        let generator = Arc::new(FakeGenerator::ok("Host: Hello.\nGuest: Hi."));
        let pipeline = pipeline(
            Settings::default(),
            store.clone(),
            generator,
            Arc::new(WavSynth::default()),
        );

        let output = pipeline
            .instant_podcast("greetings", "People say hello.")
            .await
            .unwrap();
        assert_eq!(output.track.segments, vec![0, 1]);
        assert_eq!(store.collection_count(), 0);
    }

    #[tokio::test]
    async fn test_instant_podcast_cleans_up_on_failure() {
        let store = Arc::new(MemoryKnowledgeStore::new());
        let generator = Arc::new(FakeGenerator::failing(PodforgeError::GenerationStatus {
            status: 503,
            body: "down".to_string(),
        }));
        let pipeline = pipeline(
            Settings::default(),
            store.clone(),
            generator,
            Arc::new(WavSynth::default()),
        );

        let err = pipeline.instant_podcast("topic", "text").await.unwrap_err();
        assert!(matches!(err, PodforgeError::GenerationStatus { status: 503, .. }));
        assert_eq!(store.collection_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let store = Arc::new(MemoryKnowledgeStore::new());
        let pipeline = pipeline(
            Settings::default(),
            store,
            Arc::new(FakeGenerator::ok("Host: hi")),
            Arc::new(WavSynth::default()),
        );

        assert!(matches!(
            pipeline.finish_podcast("  ", "c1").await,
            Err(PodforgeError::InvalidInput(_))
        ));
        assert!(matches!(
            pipeline.instant_podcast("topic", "").await,
            Err(PodforgeError::InvalidInput(_))
        ));
    }

    /// Fails to create collections but records every delete.
    #[derive(Default)]
    struct RejectingStore {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KnowledgeStore for RejectingStore {
        async fn lookup(&self, _query: &str, _collection: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn create_collection(&self, _collection: &str, _topic: &str) -> Result<()> {
            Err(PodforgeError::KnowledgeStatus {
                route: "/create-collection",
                status: 500,
                body: "half created".to_string(),
            })
        }

        async fn upload_document(&self, _collection: &str, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_collection(&self, collection: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(collection.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_instant_podcast_deletes_after_failed_create() {
        let store = Arc::new(RejectingStore::default());
        let generator = Arc::new(FakeGenerator::ok("Host: hi"));
        let synth = Arc::new(WavSynth::default());
        let pipeline =
            Pipeline::with_components(Settings::default(), store.clone(), generator.clone(), synth);

        let err = pipeline.instant_podcast("topic", "text").await.unwrap_err();
        assert_eq!(err.stage(), "knowledge");
        assert_eq!(store.deleted.lock().unwrap().len(), 1);
        assert!(generator.contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_runs_on_spawned_task() {
        let store = store_with("c1", "Black holes.").await;
        let generator = Arc::new(FakeGenerator::ok("Host: Hello.\nGuest: Hi."));
        let synth = Arc::new(WavSynth::default());
        let pipeline = Arc::new(pipeline(Settings::default(), store, generator, synth));

        let finish = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.finish_podcast("black holes", "c1").await })
        };
        let instant = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.instant_podcast("greetings", "Hello.").await })
        };

        assert_eq!(finish.await.unwrap().unwrap().track.segments, vec![0, 1]);
        assert_eq!(instant.await.unwrap().unwrap().track.segments, vec![0, 1]);
    }
}
