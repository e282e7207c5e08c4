//! Background indicator rendered to the terminal.

use console::style;

use locus::indicator::{
    IndicatorAction, IndicatorBoard, IndicatorChannel, IndicatorContent, IndicatorHandle,
};

/// An [`IndicatorChannel`] that prints every change and keeps the posted
/// indicator in an [`IndicatorBoard`] so its actions can be triggered from
/// the console.
#[derive(Clone, Default)]
pub struct TerminalIndicator {
    board: IndicatorBoard,
}

impl TerminalIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of posted indicators.
    pub fn board(&self) -> &IndicatorBoard {
        &self.board
    }
}

impl IndicatorChannel for TerminalIndicator {
    fn post(&self, content: IndicatorContent) -> IndicatorHandle {
        println!(
            "{} {}: {}  [{} | {}]",
            style("▲ indicator").yellow().bold(),
            style(&content.title).bold(),
            content.body,
            IndicatorAction::Launch.label(),
            IndicatorAction::Cancel.label(),
        );
        self.board.post(content)
    }

    fn update(&self, handle: IndicatorHandle, body: &str) {
        if self.board.current().map(|posted| posted.handle) == Some(handle) {
            println!("{} {}", style("▲ indicator").yellow(), body);
        }
        self.board.update(handle, body);
    }

    fn dismiss(&self, handle: IndicatorHandle) {
        if self.board.current().map(|posted| posted.handle) == Some(handle) {
            println!("{}", style("▼ indicator dismissed").dim());
        }
        self.board.dismiss(handle);
    }
}
