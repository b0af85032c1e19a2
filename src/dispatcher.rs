use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::api::models::Update;
use crate::data_models::Task;
use crate::error::Result;
use crate::extractor::extract_from_stream;
use crate::fetcher::SearchFetcher;
use crate::sender::send_results;
use crate::telegram::{ChatClient, SendMessage};

pub const COMMAND_MARKER: char = '/';
pub const HELP_TEXT: &str = "Введите запрос";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
}

impl Command {
    /// Looks up the command table. `/start@my_bot` and `/start foo` both match `/start`.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name {
            "/start" => Some(Command::Start),
            _ => None,
        }
    }

    pub fn reply(&self) -> &'static str {
        match self {
            Command::Start => HELP_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Query(String),
    /// Unknown commands and blank text.
    Ignored,
}

/// Only text that starts with the marker is a command; queries are kept verbatim.
pub fn classify(text: &str) -> Input {
    if text.trim().is_empty() {
        return Input::Ignored;
    }
    if text.starts_with(COMMAND_MARKER) {
        return Command::parse(text).map_or(Input::Ignored, Input::Command);
    }
    Input::Query(text.to_string())
}

/// Long-lived handles shared by every pipeline run.
pub struct BotContext {
    pub client: Arc<dyn ChatClient>,
    pub fetcher: SearchFetcher,
}

impl BotContext {
    pub fn new(client: Arc<dyn ChatClient>, fetcher: SearchFetcher) -> BotContext {
        BotContext { client, fetcher }
    }
}

/// Fetch, extract, send. Returns the number of results delivered.
pub async fn process_task(ctx: &BotContext, task: &Task) -> Result<usize> {
    let start = Instant::now();
    let page = ctx.fetcher.fetch(&task.query).await?;
    let results = extract_from_stream(page).await?;
    let delivered = send_results(ctx.client.as_ref(), task.chat_id, &results).await;
    tracing::info!(
        elapsed = ?start.elapsed(),
        found = results.len(),
        delivered,
        "task done"
    );
    Ok(delivered)
}

/// Routes updates: commands are answered inline, queries go to a bounded
/// worker pool.
pub struct Dispatcher {
    ctx: Arc<BotContext>,
    task_tx: Mutex<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<BotContext>, workers: usize, queue_capacity: usize) -> Dispatcher {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|worker| tokio::spawn(run_worker(worker, ctx.clone(), rx.clone())))
            .collect();
        Dispatcher {
            ctx,
            task_tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    pub async fn dispatch(&self, update: &Update) {
        let Some((text, chat_id)) = update.text_and_chat() else {
            tracing::debug!(update_id = update.update_id, "update without text, skipping");
            return;
        };

        match classify(text) {
            Input::Command(command) => self.handle_command(command, chat_id).await,
            Input::Query(query) => self.submit(Task::new(query, chat_id)).await,
            Input::Ignored => {
                tracing::debug!(chat_id, text, "ignoring input");
            }
        }
    }

    async fn handle_command(&self, command: Command, chat_id: i64) {
        let reply = SendMessage::new(chat_id, command.reply());
        if let Err(e) = self.ctx.client.send_message(&reply).await {
            tracing::error!(chat_id, ?command, "error replying to command: {:#}", e);
        }
    }

    /// Queues a task; waits while the queue is full.
    pub async fn submit(&self, task: Task) {
        let tx = self.task_tx.lock().await.clone();
        let Some(tx) = tx else {
            tracing::warn!(task_id = %task.id, "dispatcher is shut down, dropping task");
            return;
        };
        tracing::debug!(task_id = %task.id, chat_id = task.chat_id, "queueing task");
        if let Err(e) = tx.send(task).await {
            tracing::warn!(task_id = %e.0.id, "worker pool is gone, dropping task");
        }
    }

    /// Stops accepting tasks and waits until the workers drained the queue.
    pub async fn shutdown(&self) {
        self.task_tx.lock().await.take();
        let handles = std::mem::take(&mut *self.workers.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("worker panicked: {}", e);
            }
        }
        tracing::info!("dispatcher stopped");
    }
}

async fn run_worker(worker: usize, ctx: Arc<BotContext>, rx: Arc<Mutex<mpsc::Receiver<Task>>>) {
    loop {
        let task = rx.lock().await.recv().await;
        let Some(task) = task else {
            break;
        };
        let span = tracing::info_span!("task", worker, task_id = %task.id, chat_id = task.chat_id);
        if let Err(e) = process_task(&ctx, &task).instrument(span).await {
            tracing::error!(task_id = %task.id, query = %task.query, "error processing task: {:#}", e);
        }
    }
}
