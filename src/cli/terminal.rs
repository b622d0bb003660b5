/// Width assumed when the terminal cannot be queried
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Source of the terminal column count
pub trait WidthSource {
    /// Column count of the controlling terminal, if it can be determined
    fn columns(&self) -> Option<usize>;
}

/// Queries the real terminal through crossterm
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalWidth;

impl WidthSource for TerminalWidth {
    fn columns(&self) -> Option<usize> {
        match crossterm::terminal::size() {
            Ok((cols, _rows)) if cols > 0 => Some(cols as usize),
            _ => None,
        }
    }
}

/// Fixed answer, or an unknown width when `None`
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub Option<usize>);

impl WidthSource for FixedWidth {
    fn columns(&self) -> Option<usize> {
        self.0.filter(|cols| *cols > 0)
    }
}

/// Column count the flag block wraps to. Queried on every call.
pub fn flag_wrap_width(source: &dyn WidthSource) -> usize {
    source
        .columns()
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
        .saturating_sub(1)
}
