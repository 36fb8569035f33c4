//! Interactive session loop.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use artsel_lib::PageCache;
use artsel_lib::PageNavigator;
use artsel_lib::SelectionSynchronizer;
use artsel_lib::SessionConfig;
use artsel_lib::error::Error;
use artsel_lib::model::Artwork;
use artsel_lib::model::Page;
use artsel_lib::selection::BulkOutcome;
use artsel_lib::source::RemoteCollectionSource;

use crate::command::Command;
use crate::command::HELP;
use crate::error::CliError;
use crate::render;

type BulkResult = Result<BulkOutcome, Error>;

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A browsing session over one collection source.
///
/// Bulk selections run in spawned tasks and report back over a channel, so
/// the prompt stays responsive while pages are walked.
pub struct Repl<S: RemoteCollectionSource<Item = Artwork> + 'static> {
    navigator: PageNavigator<S>,
    selection: SelectionSynchronizer<S>,
    finished_tx: mpsc::UnboundedSender<BulkResult>,
    finished_rx: mpsc::UnboundedReceiver<BulkResult>,
}

impl<S: RemoteCollectionSource<Item = Artwork> + 'static> Repl<S> {
    pub fn new(source: S, config: SessionConfig) -> Self {
        let pages = PageCache::new(Arc::new(source), config);
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            navigator: PageNavigator::new(pages.clone()),
            selection: SelectionSynchronizer::new(pages),
            finished_tx,
            finished_rx,
        }
    }

    /// Shows the first page and reads commands from stdin until `quit` or
    /// end of input.
    pub async fn run(mut self) -> Result<(), CliError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("type `help` for commands");
        let first = self.navigator.first().await;
        self.show(first);

        loop {
            prompt();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(command) => {
                            if self.execute(command).await == Flow::Quit {
                                break;
                            }
                        }
                        Err(e) => eprintln!("{e}"),
                    }
                }
                Some(result) = self.finished_rx.recv() => self.finished(result),
            }
        }

        if self.selection.cancel() {
            log::info!("session ended with a bulk operation running");
        }
        Ok(())
    }

    async fn execute(&self, command: Command) -> Flow {
        log::debug!("command: {command:?}");
        match command {
            Command::Page(index) => {
                let page = self.navigator.go_to(index).await;
                self.show(page);
            }
            Command::Next => {
                let page = self.navigator.next().await;
                self.show(page);
            }
            Command::Prev => {
                let page = self.navigator.previous().await;
                self.show(page);
            }
            Command::First => {
                let page = self.navigator.first().await;
                self.show(page);
            }
            Command::Last => {
                let page = self.navigator.last().await;
                self.show(page);
            }
            Command::Reload => {
                let page = self.navigator.reload().await;
                self.show(page);
            }
            Command::Toggle(ids) => self.toggle(ids),
            Command::Pick(n) => self.spawn_bulk(move |selection| async move {
                selection.select_first_n(n).await
            }),
            Command::All => {
                self.spawn_bulk(|selection| async move { selection.select_all().await })
            }
            Command::Clear => match self.selection.clear_all() {
                Ok(outcome) => {
                    print!("{}", render::outcome(&outcome));
                    self.redraw();
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::Cancel => {
                if self.selection.cancel() {
                    println!("cancelling; pages already applied stay selected");
                } else {
                    println!("nothing to cancel");
                }
            }
            Command::Status => print!(
                "{}",
                render::status(
                    self.navigator.pages().pagination().as_ref(),
                    self.selection.state(),
                    self.selection.selected_count()
                )
            ),
            Command::Selected => print!("{}", render::selected(self.selection.selected_items())),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Makes `ids` the chosen set of the page on screen.
    fn toggle(&self, ids: Vec<u64>) {
        let Some(page) = self.navigator.pages().current() else {
            eprintln!("no page loaded");
            return;
        };

        let (chosen, ignored): (HashSet<u64>, Vec<u64>) = {
            let mut chosen = HashSet::new();
            let mut ignored = Vec::new();
            for id in ids {
                if page.contains_key(&id) {
                    chosen.insert(id);
                } else {
                    ignored.push(id);
                }
            }
            (chosen, ignored)
        };

        let delta = self.selection.toggle_on_current_page(&page, &chosen);
        print!("{}", render::delta(&delta, &ignored));
        self.draw(&page);
    }

    /// Runs a bulk operation in the background; its result arrives through
    /// `finished_rx`.
    fn spawn_bulk<F, Fut>(&self, operation: F)
    where
        F: FnOnce(SelectionSynchronizer<S>) -> Fut,
        Fut: Future<Output = BulkResult> + Send + 'static,
    {
        let finished = self.finished_tx.clone();
        let fut = operation(self.selection.clone());
        tokio::spawn(async move {
            let _ = finished.send(fut.await);
        });
        println!("working in the background; `status` shows progress, `cancel` stops");
    }

    fn finished(&self, result: BulkResult) {
        println!();
        match result {
            Ok(outcome) => {
                print!("{}", render::outcome(&outcome));
                self.redraw();
            }
            Err(e) => {
                eprintln!("{e}");
                println!("{} selected", self.selection.selected_count());
            }
        }
    }

    fn show(&self, page: Result<Arc<Page<Artwork>>, Error>) {
        match page {
            Ok(page) => self.draw(&page),
            Err(e) => eprintln!("{e}"),
        }
    }

    /// Draws the page on screen again, if there is one.
    fn redraw(&self) {
        if let Some(page) = self.navigator.pages().current() {
            self.draw(&page);
        }
    }

    fn draw(&self, page: &Page<Artwork>) {
        print!(
            "{}",
            render::page(
                page,
                self.navigator.pages().pagination().as_ref(),
                &self.selection.visible_selection(page),
                self.selection.header_state(page),
                self.selection.selected_count()
            )
        );
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
