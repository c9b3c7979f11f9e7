//! Interactive query loop
//!
//! Reads a query and a result count from the console, embeds the
//! query and retrieves the nearest neighbors inside a measured span,
//! and prints the report. Invalid input is rejected before any
//! embedding or retrieval work starts, so a mistyped count costs
//! nothing.
//!
//! The loop is a two-state machine: `AwaitingInput` until the exit
//! sentinel (or end of input) moves it to `Terminated`. Per-query
//! adapter failures are printed and the loop continues; they are
//! never fatal.

use std::io::{BufRead, Write};
use std::sync::Arc;

use semq_core::{Query, Result, SemqError};
use semq_metrics::{AllocationTracer, ResourceProbe, ResourceSampler};
use semq_vector::{Embedder, VectorStore};

use crate::report;

/// Case-insensitive token that ends the session
const EXIT_SENTINEL: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitingInput,
    Terminated,
}

/// The interactive driver, generic over its input/output streams so
/// tests can run whole sessions against in-memory buffers.
pub struct QueryConsole<R, W, P, T> {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    sampler: ResourceSampler<P, T>,
    input: R,
    output: W,
}

impl<R, W, P, T> QueryConsole<R, W, P, T>
where
    R: BufRead,
    W: Write,
    P: ResourceProbe,
    T: AllocationTracer,
{
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        sampler: ResourceSampler<P, T>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            embedder,
            store,
            sampler,
            input,
            output,
        }
    }

    /// Run the loop until the exit sentinel or end of input.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "\n--- Semantic Query Console ---")?;

        let mut state = LoopState::AwaitingInput;
        while state == LoopState::AwaitingInput {
            state = self.step().await?;
        }
        Ok(())
    }

    /// One loop iteration: prompt, validate, execute.
    async fn step(&mut self) -> Result<LoopState> {
        let Some(text) = self.prompt("Enter your query (or 'exit' to quit): ")? else {
            return Ok(LoopState::Terminated);
        };
        if text.trim().eq_ignore_ascii_case(EXIT_SENTINEL) {
            return Ok(LoopState::Terminated);
        }

        let Some(count) = self.prompt("Enter the number of results to return: ")? else {
            return Ok(LoopState::Terminated);
        };

        // Validation happens after both inputs are in, before any
        // embedding or retrieval work.
        let query = match Query::parse(&text, &count) {
            Ok(query) => query,
            Err(SemqError::Validation(message)) => {
                writeln!(self.output, "{message}")?;
                return Ok(LoopState::AwaitingInput);
            }
            Err(other) => return Err(other),
        };

        self.execute(query).await?;
        Ok(LoopState::AwaitingInput)
    }

    /// Embed the query text and retrieve its neighbors, both inside
    /// the measured span.
    async fn execute(&mut self, query: Query) -> Result<()> {
        tracing::info!(text = %query.text, k = query.k, "executing query");

        let Query { text, k } = query;
        let embedder = Arc::clone(&self.embedder);
        let store = Arc::clone(&self.store);

        // The whole embed-then-retrieve span sits inside the
        // measurement window; prompting and parsing never count
        // against the query. Embedding is usually the dominant cost,
        // so leaving it out would gut the report.
        let (retrieved, sample) = self
            .sampler
            .measure(async move {
                let vectors = embedder.embed_batch(std::slice::from_ref(&text)).await?;
                let vector = vectors
                    .into_iter()
                    .next()
                    .ok_or_else(|| SemqError::Embedding("No embedding returned".to_string()))?;
                store.nearest_neighbors(&vector, k).await
            })
            .await;

        match retrieved {
            Ok(matches) => {
                self.output
                    .write_all(report::render(&matches, &sample).as_bytes())?;
            }
            Err(e) => writeln!(self.output, "Query failed: {e}")?,
        }
        Ok(())
    }

    /// Print a prompt and read one line. `None` means end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use semq_core::{Match, RetrievalResult};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    struct FakeEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SemqError::Embedding("model unavailable".to_string()));
            }
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct FakeStore {
        calls: AtomicUsize,
        matches: Vec<Match>,
        fail: bool,
    }

    impl FakeStore {
        fn with_matches(matches: Vec<Match>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                matches,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                matches: Vec::new(),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn nearest_neighbors(&self, _query: &[f32], k: usize) -> Result<RetrievalResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SemqError::StoreUnavailable("index corrupted".to_string()));
            }
            Ok(self.matches.iter().take(k).cloned().collect())
        }
    }

    struct NullProbe;

    impl ResourceProbe for NullProbe {
        fn wall_now(&mut self) -> Instant {
            Instant::now()
        }

        fn cpu_seconds(&mut self) -> f64 {
            0.0
        }

        fn logical_cores(&self) -> usize {
            1
        }

        fn process_memory_percent(&mut self) -> f64 {
            0.0
        }
    }

    struct NullTracer;

    impl AllocationTracer for NullTracer {
        fn begin_window(&mut self) {}

        fn window_usage(&mut self) -> (u64, u64) {
            (0, 0)
        }
    }

    fn five_doc_store() -> Arc<FakeStore> {
        FakeStore::with_matches(vec![
            Match {
                document: "a".to_string(),
                distance: 0.1,
            },
            Match {
                document: "b".to_string(),
                distance: 0.5,
            },
            Match {
                document: "c".to_string(),
                distance: 0.5,
            },
            Match {
                document: "d".to_string(),
                distance: 0.9,
            },
            Match {
                document: "e".to_string(),
                distance: 1.2,
            },
        ])
    }

    async fn run_session(
        input: &str,
        embedder: Arc<FakeEmbedder>,
        store: Arc<FakeStore>,
    ) -> String {
        let mut console = QueryConsole::new(
            embedder,
            store,
            ResourceSampler::new(NullProbe, NullTracer),
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
        );
        console.run().await.unwrap();
        String::from_utf8(console.output).unwrap()
    }

    // ------------------------------------------------------------------
    // Exit sentinel
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_exit_sentinel_terminates_without_adapter_calls() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("exit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("--- Semantic Query Console ---"));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_exit_sentinel_is_case_insensitive() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        for sentinel in ["EXIT\n", "Exit\n", "eXiT\n"] {
            let _ = run_session(sentinel, embedder.clone(), store.clone()).await;
        }
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_of_input_terminates_cleanly() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();

        // EOF at the query prompt, and EOF at the count prompt.
        let _ = run_session("", embedder.clone(), store.clone()).await;
        let _ = run_session("apple\n", embedder.clone(), store.clone()).await;

        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    // ------------------------------------------------------------------
    // Validation: no resource cost for invalid input
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_negative_count_is_rejected_without_retrieval() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("apple\n-2\nexit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("Please enter a valid positive number."));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
        // The loop stayed alive: the exit prompt was printed again.
        assert_eq!(output.matches("Enter your query").count(), 2);
    }

    #[tokio::test]
    async fn test_non_numeric_count_is_rejected_without_retrieval() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("apple\nthree\nexit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("Invalid input. Please enter a number."));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_query_text_is_rejected_without_retrieval() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("   \n3\nexit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("Query text cannot be empty."));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_top_three_of_five_keeps_tie_order() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("apple\n3\nexit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("Document: a | Distance: 0.1000"));
        assert!(output.contains("Document: b | Distance: 0.5000"));
        assert!(output.contains("Document: c | Distance: 0.5000"));
        assert!(!output.contains("Document: d"));
        assert!(!output.contains("Document: e"));

        // Equal distances keep the store-reported order.
        let b = output.find("Document: b").unwrap();
        let c = output.find("Document: c").unwrap();
        assert!(b < c);

        assert_eq!(embedder.calls(), 1);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_count_larger_than_store_returns_everything() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("apple\n10\nexit\n", embedder.clone(), store.clone()).await;

        assert_eq!(output.matches("Document: ").count(), 5);
    }

    #[tokio::test]
    async fn test_repeated_query_is_idempotent() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output =
            run_session("apple\n2\napple\n2\nexit\n", embedder.clone(), store.clone()).await;

        assert_eq!(store.calls(), 2);
        assert_eq!(output.matches("Document: a | Distance: 0.1000").count(), 2);
        assert_eq!(output.matches("Document: b | Distance: 0.5000").count(), 2);
    }

    #[tokio::test]
    async fn test_embedding_runs_inside_measurement_window() {
        // Tracer that flags when the window opens, and an embedder
        // that records whether the window was already open when it
        // was invoked. Embedding cost belongs to the measured span.
        struct WindowTracer {
            open: Arc<AtomicBool>,
        }

        impl AllocationTracer for WindowTracer {
            fn begin_window(&mut self) {
                self.open.store(true, Ordering::SeqCst);
            }

            fn window_usage(&mut self) -> (u64, u64) {
                (0, 0)
            }
        }

        struct WindowAwareEmbedder {
            window_open: Arc<AtomicBool>,
            embedded_inside_window: Arc<AtomicBool>,
        }

        #[async_trait]
        impl Embedder for WindowAwareEmbedder {
            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                self.embedded_inside_window
                    .store(self.window_open.load(Ordering::SeqCst), Ordering::SeqCst);
                Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
            }

            fn dimension(&self) -> usize {
                4
            }
        }

        let window_open = Arc::new(AtomicBool::new(false));
        let embedded_inside_window = Arc::new(AtomicBool::new(false));

        let mut console = QueryConsole::new(
            Arc::new(WindowAwareEmbedder {
                window_open: window_open.clone(),
                embedded_inside_window: embedded_inside_window.clone(),
            }),
            five_doc_store(),
            ResourceSampler::new(
                NullProbe,
                WindowTracer {
                    open: window_open,
                },
            ),
            Cursor::new(b"apple\n2\nexit\n".to_vec()),
            Vec::new(),
        );
        console.run().await.unwrap();

        assert!(
            embedded_inside_window.load(Ordering::SeqCst),
            "embed ran before the measurement window opened"
        );
    }

    #[tokio::test]
    async fn test_report_includes_metrics_block() {
        let embedder = FakeEmbedder::new();
        let store = five_doc_store();
        let output = run_session("apple\n1\nexit\n", embedder, store).await;

        assert!(output.contains("--- Performance Metrics ---"));
        assert!(output.contains("Time taken: "));
        assert!(output.contains("CPU usage: "));
        assert!(output.contains("Memory usage (system): "));
    }

    // ------------------------------------------------------------------
    // Per-query failures keep the loop alive
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_embedding_failure_is_reported_and_loop_continues() {
        let embedder = FakeEmbedder::failing();
        let store = five_doc_store();
        let output = run_session("apple\n3\npear\n3\nexit\n", embedder.clone(), store.clone())
            .await;

        assert!(output.contains("Query failed: Embedding error: model unavailable"));
        // Both iterations attempted the embed; retrieval never ran.
        assert_eq!(embedder.calls(), 2);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_and_loop_continues() {
        let embedder = FakeEmbedder::new();
        let store = FakeStore::failing();
        let output = run_session("apple\n3\nexit\n", embedder.clone(), store.clone()).await;

        assert!(output.contains("Query failed: Vector store unavailable: index corrupted"));
        assert_eq!(store.calls(), 1);
        // The session still ended normally via the sentinel.
        assert_eq!(output.matches("Enter your query").count(), 2);
    }
}
