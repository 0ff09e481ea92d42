//! Options generation: prompt → LLM → cleaned options file + reasoning.
//!
//! The initial and iterative paths report a failed LLM call as `None` and
//! leave retrying to the caller. The midway path runs inline while a
//! regression is being repaired, so a failed call there is an error.

use std::sync::Arc;

use thiserror::Error;

use crate::llm::OptionsLlm;
use crate::options::OptionsCleaner;
use crate::prompt::{self, PromptContext, PromptError};
use crate::types::{ConfigAttempt, GeneratedOptions, PromptPayload, ResourceUsage};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Failed to get a valid response from LLM for midway options generation")]
    NoValidResponse,
}

pub struct OptionsGenerator {
    llm: Arc<dyn OptionsLlm>,
    cleaner: Arc<dyn OptionsCleaner>,
    context: PromptContext,
}

impl OptionsGenerator {
    pub fn new(
        llm: Arc<dyn OptionsLlm>,
        cleaner: Arc<dyn OptionsCleaner>,
        context: PromptContext,
    ) -> Self {
        Self {
            llm,
            cleaner,
            context,
        }
    }

    pub fn context(&self) -> &PromptContext {
        &self.context
    }

    /// First generation from the baseline options file.
    pub async fn generate_initial(
        &self,
        current: &ConfigAttempt,
        usage: Option<ResourceUsage>,
        temperature: f64,
    ) -> Option<GeneratedOptions> {
        tracing::info!("Generating options file from the baseline");
        let payload = prompt::initial_prompt(&self.context, current, usage, temperature);
        self.request(&payload).await
    }

    /// Generation from the full history; the current file is the last attempt's.
    ///
    /// Returns `Ok(None)` when the LLM gave no usable answer.
    pub async fn generate_iterative(
        &self,
        history: &[ConfigAttempt],
        usage: Option<ResourceUsage>,
        temperature: f64,
    ) -> Result<Option<GeneratedOptions>, GenerationError> {
        tracing::info!("Generating options file with long option changes");
        let current = history.last().ok_or(PromptError::EmptyHistory)?;
        let payload = prompt::iterative_prompt(
            &self.context,
            history,
            &current.config_text,
            usage,
            temperature,
        )?;
        Ok(self.request(&payload).await)
    }

    /// Generation from the additions `candidate` made to the last recorded
    /// file and the throughput it reached.
    pub async fn generate_midway(
        &self,
        history: &[ConfigAttempt],
        candidate: &str,
        last_throughput: f64,
        temperature: f64,
    ) -> Result<GeneratedOptions, GenerationError> {
        tracing::info!("Generating options file with differences");
        let payload = prompt::midway_prompt(
            &self.context,
            history,
            candidate,
            last_throughput,
            temperature,
        )?;
        if let Some(instruction) = payload.user_turns.last() {
            tracing::debug!("Midway prompt instruction: {}", instruction);
        }
        self.request(&payload)
            .await
            .ok_or(GenerationError::NoValidResponse)
    }

    async fn request(&self, payload: &PromptPayload) -> Option<GeneratedOptions> {
        tracing::debug!(
            "Sending prompt: {} user turns, temperature {}",
            payload.user_turns.len(),
            payload.temperature
        );
        match self
            .llm
            .invoke(&payload.system, &payload.user_turns, payload.temperature)
            .await
        {
            Some(response) => Some(GeneratedOptions {
                options: self.cleaner.cleanup(&response.options_block),
                reasoning: response.reasoning(),
            }),
            None => {
                tracing::warn!("No valid LLM response for options generation");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::IniCleaner;
    use crate::types::{BenchmarkResult, LlmResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed answer and records every request.
    #[derive(Default)]
    struct FakeLlm {
        reply: Option<LlmResponse>,
        calls: Mutex<Vec<(String, Vec<String>, f64)>>,
    }

    impl FakeLlm {
        fn answering(before: &str, block: &str, after: &str) -> Self {
            Self {
                reply: Some(LlmResponse {
                    reasoning_before: before.to_string(),
                    options_block: block.to_string(),
                    reasoning_after: after.to_string(),
                }),
                calls: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl OptionsLlm for FakeLlm {
        async fn invoke(
            &self,
            system: &str,
            user_turns: &[String],
            temperature: f64,
        ) -> Option<LlmResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user_turns.to_vec(), temperature));
            self.reply.clone()
        }
    }

    fn generator(llm: Arc<FakeLlm>) -> OptionsGenerator {
        OptionsGenerator::new(
            llm,
            Arc::new(IniCleaner),
            PromptContext::new("8.8.1", "test host", "fillrandom"),
        )
    }

    fn history(n: usize) -> Vec<ConfigAttempt> {
        (0..n)
            .map(|i| {
                ConfigAttempt::new(
                    format!("a = {}\n", i),
                    BenchmarkResult::new(10.0, "MB/s", 100.0 * (i + 1) as f64),
                    format!("reason {}", i),
                    "",
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_initial_success_cleans_block_and_joins_reasoning() {
        let llm = Arc::new(FakeLlm::answering("Before. ", "\n  a = 2   \n\n", "After."));
        let generated = generator(llm.clone())
            .generate_initial(&history(1)[0], None, 0.4)
            .await
            .unwrap();
        assert_eq!(generated.options, "  a = 2\n");
        assert_eq!(generated.reasoning, "Before. After.");

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("only change 10 options"));
        assert_eq!(calls[0].1.len(), 1);
        assert_eq!(calls[0].2, 0.4);
    }

    #[tokio::test]
    async fn test_initial_failure_is_soft() {
        let llm = Arc::new(FakeLlm::default());
        assert!(generator(llm)
            .generate_initial(&history(1)[0], None, 0.4)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_iterative_failure_is_soft() {
        let llm = Arc::new(FakeLlm::default());
        let result = generator(llm).generate_iterative(&history(4), None, 0.4).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_iterative_shows_last_file_as_current() {
        let llm = Arc::new(FakeLlm::answering("", "a = 9", ""));
        let generated = generator(llm.clone())
            .generate_iterative(&history(4), None, 0.7)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(generated.options, "a = 9\n");

        let calls = llm.calls.lock().unwrap();
        let turns = &calls[0].1;
        assert_eq!(turns.len(), 4);
        assert!(turns[2].contains("```\na = 3\n```"));
        assert_eq!(calls[0].2, 0.7);
    }

    #[tokio::test]
    async fn test_iterative_rejects_empty_history() {
        let llm = Arc::new(FakeLlm::answering("", "a = 1", ""));
        let result = generator(llm.clone()).generate_iterative(&[], None, 0.4).await;
        assert!(matches!(
            result,
            Err(GenerationError::Prompt(PromptError::EmptyHistory))
        ));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_midway_failure_is_fatal() {
        let llm = Arc::new(FakeLlm::default());
        let result = generator(llm)
            .generate_midway(&history(2), "a = 5\n", 50.0, 0.4)
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, GenerationError::NoValidResponse));
        assert!(err.to_string().contains("midway"));
    }

    #[tokio::test]
    async fn test_midway_success_uses_diff_prompt() {
        let llm = Arc::new(FakeLlm::answering("r1 ", "a = 6\nb = 1", "r2"));
        let generated = generator(llm.clone())
            .generate_midway(&history(2), "a = 5\n", 50.0, 0.4)
            .await
            .unwrap();
        assert_eq!(generated.options, "a = 6\nb = 1\n");
        assert_eq!(generated.reasoning, "r1 r2");

        let calls = llm.calls.lock().unwrap();
        let turns = &calls[0].1;
        assert_eq!(turns.len(), 3);
        assert!(turns[1].contains("```\na = 5\n```"));
        assert!(turns[1].contains("throughput of: 50."));
    }
}
