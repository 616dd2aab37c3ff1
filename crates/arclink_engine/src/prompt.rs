//! Operator disambiguation for ambiguous search results.

use arclink_logging::{arclink_info, arclink_warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Whoever settles ambiguous matches.
#[async_trait::async_trait]
pub trait Operator: Send {
    /// Shows a numbered menu.
    fn present(&mut self, menu: &str);

    /// Next line typed by the operator; `None` once input is closed.
    async fn read_line(&mut self) -> Option<String>;
}

/// Operator at the terminal: menus go to the log, answers come from stdin.
pub struct ConsoleOperator {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Operator for ConsoleOperator {
    fn present(&mut self, menu: &str) {
        arclink_info!("{}", menu);
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                arclink_warn!("Could not read operator input: {}", err);
                None
            }
        }
    }
}

/// One line of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry<'a> {
    pub text: &'a str,
    pub link: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    NoneOfThese,
    Pick(usize),
}

/// Maps typed input onto a menu of `len` entries. `0` means none of them,
/// `1..=len` picks an entry; anything else is rejected.
pub fn parse_choice(input: &str, len: usize) -> Option<Choice> {
    let value: i64 = input.trim().parse().ok()?;
    match value {
        0 => Some(Choice::NoneOfThese),
        v if v >= 1 && (v as u64) <= len as u64 => Some(Choice::Pick((v - 1) as usize)),
        _ => None,
    }
}

pub fn render_menu(title: &str, entries: &[MenuEntry<'_>]) -> String {
    let lines = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("{}: {} ({})", index + 1, entry.text, entry.link))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n\nFound multiple results for '{title}', select the correct result, or 0 if none.\n{lines}"
    )
}

/// Asks the operator to pick one entry, re-prompting on bad input.
///
/// Returns the 0-based index picked, or `None` for "none of these". Closed
/// input counts as "none of these".
pub async fn choose(
    operator: &mut dyn Operator,
    title: &str,
    entries: &[MenuEntry<'_>],
) -> Option<usize> {
    operator.present(&render_menu(title, entries));
    loop {
        let Some(line) = operator.read_line().await else {
            arclink_warn!("Operator input closed, no result chosen for '{}'", title);
            return None;
        };
        match parse_choice(&line, entries.len()) {
            Some(Choice::NoneOfThese) => return None,
            Some(Choice::Pick(index)) => return Some(index),
            None => arclink_info!("Retry"),
        }
    }
}
