use crate::batch::{
    Args, BatchOperation, BatchQueue, HttpOptions, HttpVerb, ParallelBatchExecutor, PostProcess,
};
use crate::types::CallResult;
use crate::Result;

/// Entry point: owns the shared executor and hands out batch contexts.
#[derive(Clone)]
pub struct GraphBatchClient {
    executor: ParallelBatchExecutor,
}

impl GraphBatchClient {
    /// Client configured from the environment.
    pub fn new() -> Result<Self> {
        crate::client::builder::GraphBatchClientBuilder::new().build()
    }

    pub fn builder() -> crate::client::builder::GraphBatchClientBuilder {
        crate::client::builder::GraphBatchClientBuilder::new()
    }

    pub fn from_executor(executor: ParallelBatchExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &ParallelBatchExecutor {
        &self.executor
    }

    /// A fresh batch context for `credential`.
    pub fn batch_api(&self, credential: impl Into<String>) -> BatchApi {
        BatchApi::new(credential, self.executor.clone())
    }

    /// Block form: `f` queues calls on a fresh context, which is then executed.
    ///
    /// ```rust,no_run
    /// # async fn demo(client: graph_batch_rust::GraphBatchClient) -> graph_batch_rust::Result<()> {
    /// let results = client
    ///     .batch("access-token", |b| {
    ///         b.get_object("me", Default::default());
    ///         b.get_connections("me", "friends", Default::default());
    ///     })
    ///     .await?;
    /// assert_eq!(results.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn batch<F>(&self, credential: impl Into<String>, f: F) -> Result<Vec<CallResult>>
    where
        F: FnOnce(&BatchApi),
    {
        let api = self.batch_api(credential);
        f(&api);
        api.execute(&HttpOptions::default()).await
    }
}

/// One orchestration context: a credential and the calls queued under it.
///
/// Calls return nothing when queued; their results come back from
/// [`BatchApi::execute`] in queue order.
pub struct BatchApi {
    credential: String,
    queue: BatchQueue,
    executor: ParallelBatchExecutor,
}

impl BatchApi {
    pub fn new(credential: impl Into<String>, executor: ParallelBatchExecutor) -> Self {
        Self {
            credential: credential.into(),
            queue: BatchQueue::new(),
            executor,
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a call. `options.access_token` overrides the context credential
    /// for this call only.
    pub fn graph_call(
        &self,
        path: impl Into<String>,
        args: Args,
        verb: HttpVerb,
        options: HttpOptions,
        post_process: Option<PostProcess>,
    ) {
        let credential = options
            .access_token
            .clone()
            .unwrap_or_else(|| self.credential.clone());
        let mut op = BatchOperation::new(path, verb, credential)
            .with_args(args)
            .with_options(options);
        if let Some(f) = post_process {
            op = op.with_post_process(f);
        }
        self.queue.enqueue(op);
    }

    /// Queue an already built operation as-is.
    pub fn enqueue(&self, op: BatchOperation) {
        self.queue.enqueue(op);
    }

    pub fn get_object(&self, id: &str, args: Args) {
        self.graph_call(id, args, HttpVerb::Get, HttpOptions::default(), None);
    }

    pub fn get_connections(&self, id: &str, connection: &str, args: Args) {
        self.graph_call(
            format!("{}/{}", id, connection),
            args,
            HttpVerb::Get,
            HttpOptions::default(),
            None,
        );
    }

    pub fn put_connections(&self, id: &str, connection: &str, args: Args) {
        self.graph_call(
            format!("{}/{}", id, connection),
            args,
            HttpVerb::Post,
            HttpOptions::default(),
            None,
        );
    }

    pub fn delete_object(&self, id: &str) {
        self.graph_call(id, Args::new(), HttpVerb::Delete, HttpOptions::default(), None);
    }

    /// Run everything queued so far; the queue is empty afterwards.
    pub async fn execute(&self, http_options: &HttpOptions) -> Result<Vec<CallResult>> {
        self.executor
            .execute(&self.credential, &self.queue, http_options)
            .await
    }
}
