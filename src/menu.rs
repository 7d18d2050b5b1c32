//! Hierarchical menus.
//!
//! A menu prints its title and numbered items, then reads selections
//! until the go-up switch is pressed. Hierarchy comes from actions that
//! start another menu on the same console: returning from the nested
//! `start` resumes the parent right at its prompt.
//!
//! Structure:
//! - `Choice` and the decoders: raw input → meaning (pure, swappable)
//! - `next_state`: the navigation transition table (pure)
//! - `Menu::start`: the effects loop driving both

use std::fmt;
use std::io;

use log::debug;

use crate::console::{print_title, Console};
use crate::error::ShellResult;
use crate::types::{to_upper, SelectionMode, ShellConfig, Switches};

/// Message printed for a selection that matches no item.
pub const INVALID_ANSWER: &str = "Invalid answer.";

// ============================================================================
// ITEMS
// ============================================================================

/// Side effect run when an item is selected.
pub type Action = Box<dyn FnMut(&mut dyn Console) -> ShellResult<()>>;

/// A labeled, selectable menu entry.
pub struct MenuItem {
    pub label: String,
    /// Redraw the whole menu after the action instead of only reprompting.
    pub refresh_after_action: bool,
    action: Option<Action>,
}

impl MenuItem {
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut dyn Console) -> ShellResult<()> + 'static,
    {
        Self {
            label: label.into(),
            refresh_after_action: false,
            action: Some(Box::new(action)),
        }
    }

    /// An item whose selection does nothing.
    pub fn no_op(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            refresh_after_action: false,
            action: None,
        }
    }

    pub fn refresh(mut self, refresh_after_action: bool) -> Self {
        self.refresh_after_action = refresh_after_action;
        self
    }

    /// Run the action, if any.
    pub fn invoke(&mut self, console: &mut dyn Console) -> ShellResult<()> {
        match self.action.as_mut() {
            Some(action) => action(console),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("label", &self.label)
            .field("refresh_after_action", &self.refresh_after_action)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

// ============================================================================
// SELECTION DECODING
// ============================================================================

/// What a piece of user input means at the menu prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    GoUp,
    Debug,
    /// Zero-based index of a valid item.
    Select(usize),
    Invalid,
}

/// Reads raw input and turns it into a [`Choice`].
pub trait SelectionDecoder {
    fn read_choice(
        &self,
        console: &mut dyn Console,
        switches: &Switches,
        item_count: usize,
    ) -> io::Result<Choice>;
}

/// One keypress per selection. Items 1–9 are reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyDecoder;

impl SelectionDecoder for KeyDecoder {
    fn read_choice(
        &self,
        console: &mut dyn Console,
        switches: &Switches,
        item_count: usize,
    ) -> io::Result<Choice> {
        let key = console.read_key()?;
        console.write_line("")?;
        Ok(decode_key(key, switches, item_count))
    }
}

/// One line per selection. Any item index is reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDecoder;

impl SelectionDecoder for LineDecoder {
    fn read_choice(
        &self,
        console: &mut dyn Console,
        switches: &Switches,
        item_count: usize,
    ) -> io::Result<Choice> {
        let line = console.read_line()?;
        Ok(decode_line(&line, switches, item_count))
    }
}

/// Decode a single keypress. Switches match case-insensitively.
pub fn decode_key(key: char, switches: &Switches, item_count: usize) -> Choice {
    let key = to_upper(key);

    if key == switches.go_up() {
        return Choice::GoUp;
    }
    if key == switches.debug() {
        return Choice::Debug;
    }

    match key.to_digit(10) {
        Some(digit) => select(digit as usize, item_count),
        None => Choice::Invalid,
    }
}

/// Decode a whole line: a lone switch character or a 1-based index.
pub fn decode_line(line: &str, switches: &Switches, item_count: usize) -> Choice {
    let line = line.trim();

    let mut chars = line.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let c = to_upper(c);
        if c == switches.go_up() {
            return Choice::GoUp;
        }
        if c == switches.debug() {
            return Choice::Debug;
        }
    }

    match line.parse::<usize>() {
        Ok(number) => select(number, item_count),
        Err(_) => Choice::Invalid,
    }
}

/// Map a 1-based number onto an item index.
fn select(number: usize, item_count: usize) -> Choice {
    if (1..=item_count).contains(&number) {
        Choice::Select(number - 1)
    } else {
        Choice::Invalid
    }
}

/// The decoder a selection mode stands for.
pub fn decoder_for(mode: SelectionMode) -> Box<dyn SelectionDecoder> {
    match mode {
        SelectionMode::Key => Box::new(KeyDecoder),
        SelectionMode::Line => Box::new(LineDecoder),
    }
}

// ============================================================================
// NAVIGATION STATES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// Banner and item list are (re)printed.
    Displaying,
    /// Prompt and read a selection.
    AwaitingKey,
    Exit,
}

/// Where a choice leads once its side effects have run.
///
/// `refresh` is the selected item's `refresh_after_action` (ignored for
/// every other choice).
pub fn next_state(choice: Choice, refresh: bool) -> MenuState {
    match choice {
        Choice::GoUp => MenuState::Exit,
        Choice::Debug => MenuState::Displaying,
        Choice::Invalid => MenuState::AwaitingKey,
        Choice::Select(_) if refresh => MenuState::Displaying,
        Choice::Select(_) => MenuState::AwaitingKey,
    }
}

// ============================================================================
// MENU
// ============================================================================

pub struct Menu {
    pub title: String,
    items: Vec<MenuItem>,
    config: ShellConfig,
    decoder: Box<dyn SelectionDecoder>,
}

impl Menu {
    /// An empty menu; the decoder follows `config.selection`.
    pub fn new(title: impl Into<String>, config: ShellConfig) -> Self {
        let decoder = decoder_for(config.selection);
        Self {
            title: title.into(),
            items: Vec::new(),
            config,
            decoder,
        }
    }

    pub fn with_items(title: impl Into<String>, config: ShellConfig, items: Vec<MenuItem>) -> Self {
        let mut menu = Self::new(title, config);
        menu.items = items;
        menu
    }

    /// Builder form of [`Menu::add_item`].
    pub fn item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_item(&mut self, item: MenuItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Replace the selection decoder.
    pub fn with_decoder(mut self, decoder: impl SelectionDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Run the menu, clearing the screen per the configuration.
    pub fn run(&mut self, console: &mut dyn Console) -> ShellResult<()> {
        let new_screen = self.config.new_screen;
        self.start(console, new_screen)
    }

    /// Run the menu until the go-up switch is pressed.
    ///
    /// `new_screen` clears the screen before every full redraw. Errors from
    /// actions, the debug hook or the console end the loop and propagate.
    pub fn start(&mut self, console: &mut dyn Console, new_screen: bool) -> ShellResult<()> {
        let mut state = MenuState::Displaying;

        loop {
            state = match state {
                MenuState::Displaying => {
                    self.display(console, new_screen)?;
                    MenuState::AwaitingKey
                }
                MenuState::AwaitingKey => self.await_choice(console)?,
                MenuState::Exit => {
                    debug!("menu {:?}: exit", self.title);
                    return Ok(());
                }
            };
        }
    }

    fn display(&self, console: &mut dyn Console, new_screen: bool) -> io::Result<()> {
        print_title(console, &self.title, new_screen)?;
        for (i, item) in self.items.iter().enumerate() {
            console.write_line(&format!("    {}. {}", i + 1, item.label))?;
        }
        console.write_line("")
    }

    fn prompt(&self) -> String {
        format!(
            "Choose from 1 to {}, or {} for top: ",
            self.items.len(),
            self.config.switches.go_up()
        )
    }

    /// Prompt once, act on the answer, and return the next state.
    fn await_choice(&mut self, console: &mut dyn Console) -> ShellResult<MenuState> {
        console.write(&self.prompt())?;
        let choice = self
            .decoder
            .read_choice(console, &self.config.switches, self.items.len())?;
        debug!("menu {:?}: {:?}", self.title, choice);

        let mut refresh = false;
        match choice {
            Choice::GoUp => {}
            Choice::Debug => {
                if let Some(hook) = self.config.debug_hook.clone() {
                    hook(console)?;
                }
            }
            Choice::Invalid => console.write_line(INVALID_ANSWER)?,
            Choice::Select(index) => {
                let item = &mut self.items[index];
                item.invoke(console)?;
                refresh = item.refresh_after_action;
            }
        }

        Ok(next_state(choice, refresh))
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("title", &self.title)
            .field("items", &self.items)
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::error::ShellError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Menu with `n` items, each bumping its own counter.
    fn counting_menu(n: usize, config: ShellConfig) -> (Menu, Vec<Rc<Cell<u32>>>) {
        let counters: Vec<Rc<Cell<u32>>> = (0..n).map(|_| Rc::new(Cell::new(0))).collect();
        let mut menu = Menu::new("Start", config);
        for (i, counter) in counters.iter().enumerate() {
            let counter = Rc::clone(counter);
            menu.add_item(MenuItem::new(format!("Item {}", i + 1), move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            }));
        }
        (menu, counters)
    }

    fn counts(counters: &[Rc<Cell<u32>>]) -> Vec<u32> {
        counters.iter().map(|c| c.get()).collect()
    }

    fn banners(output: &str, title: &str) -> usize {
        output.matches(&format!("{title}\n{}\n", "=".repeat(title.len()))).count()
    }

    // --- Decoding ---

    #[test]
    fn key_digits_in_range_select() {
        let switches = Switches::default();
        assert_eq!(decode_key('1', &switches, 3), Choice::Select(0));
        assert_eq!(decode_key('3', &switches, 3), Choice::Select(2));
    }

    #[test]
    fn key_zero_and_out_of_range_are_invalid() {
        let switches = Switches::default();
        assert_eq!(decode_key('0', &switches, 3), Choice::Invalid);
        assert_eq!(decode_key('4', &switches, 3), Choice::Invalid);
        assert_eq!(decode_key('x', &switches, 3), Choice::Invalid);
        assert_eq!(decode_key('\n', &switches, 3), Choice::Invalid);
    }

    #[test]
    fn key_switches_match_case_insensitively() {
        let switches = Switches::default();
        assert_eq!(decode_key('c', &switches, 3), Choice::GoUp);
        assert_eq!(decode_key('C', &switches, 3), Choice::GoUp);
        assert_eq!(decode_key('d', &switches, 3), Choice::Debug);
    }

    #[test]
    fn line_accepts_multi_digit_indexes() {
        let switches = Switches::default();
        assert_eq!(decode_line("12", &switches, 12), Choice::Select(11));
        assert_eq!(decode_line(" 2 ", &switches, 12), Choice::Select(1));
        assert_eq!(decode_line("13", &switches, 12), Choice::Invalid);
        assert_eq!(decode_line("", &switches, 12), Choice::Invalid);
        assert_eq!(decode_line("c", &switches, 12), Choice::GoUp);
        assert_eq!(decode_line("cd", &switches, 12), Choice::Invalid);
    }

    // --- Transitions ---

    #[test]
    fn transition_table() {
        assert_eq!(next_state(Choice::GoUp, false), MenuState::Exit);
        assert_eq!(next_state(Choice::Debug, false), MenuState::Displaying);
        assert_eq!(next_state(Choice::Invalid, true), MenuState::AwaitingKey);
        assert_eq!(next_state(Choice::Select(0), true), MenuState::Displaying);
        assert_eq!(next_state(Choice::Select(0), false), MenuState::AwaitingKey);
    }

    // --- Loop ---

    #[test]
    fn displays_numbered_items() {
        let (mut menu, _) = counting_menu(2, ShellConfig::default());
        let mut console = ScriptedConsole::new().key('C');
        menu.start(&mut console, false).unwrap();

        let out = console.output();
        assert!(out.starts_with("Start\n=====\n\n    1. Item 1\n    2. Item 2\n\n"));
        assert!(out.contains("Choose from 1 to 2, or C for top: "));
    }

    #[test]
    fn valid_selection_runs_only_that_action_once() {
        let (mut menu, counters) = counting_menu(3, ShellConfig::default());
        let mut console = ScriptedConsole::new().keys("2C");
        menu.start(&mut console, false).unwrap();

        assert_eq!(counts(&counters), vec![0, 1, 0]);
        assert_eq!(console.remaining(), 0);
    }

    #[test]
    fn invalid_selections_run_nothing_and_do_not_redraw() {
        let (mut menu, counters) = counting_menu(3, ShellConfig::default());
        let mut console = ScriptedConsole::new().keys("04x C");
        menu.start(&mut console, true).unwrap();

        assert_eq!(counts(&counters), vec![0, 0, 0]);
        assert_eq!(console.output().matches(INVALID_ANSWER).count(), 4);
        assert_eq!(banners(console.output(), "Start"), 1);
        assert_eq!(menu.items().len(), 3);
    }

    #[test]
    fn refreshing_item_redraws_menu() {
        let (menu, _) = counting_menu(1, ShellConfig::default());
        let mut menu = Menu::with_items(
            "Start",
            ShellConfig::default(),
            menu.items.into_iter().map(|item| item.refresh(true)).collect(),
        );
        let mut console = ScriptedConsole::new().keys("11C");
        menu.start(&mut console, true).unwrap();

        assert_eq!(banners(console.output(), "Start"), 3);
        assert_eq!(console.clears(), 3);
    }

    #[test]
    fn plain_item_only_reprompts() {
        let (mut menu, counters) = counting_menu(1, ShellConfig::default());
        let mut console = ScriptedConsole::new().keys("11C");
        menu.start(&mut console, true).unwrap();

        assert_eq!(counts(&counters), vec![2]);
        assert_eq!(banners(console.output(), "Start"), 1);
        assert_eq!(console.output().matches("Choose from").count(), 3);
    }

    #[test]
    fn debug_switch_runs_hook_and_redraws() {
        let hits = Rc::new(Cell::new(0));
        let hook_hits = Rc::clone(&hits);
        let config = ShellConfig::default().with_debug_hook(move |console| {
            hook_hits.set(hook_hits.get() + 1);
            console.write_line("debug!")?;
            Ok(())
        });

        let (mut menu, counters) = counting_menu(2, config);
        let mut console = ScriptedConsole::new().keys("dC");
        menu.start(&mut console, false).unwrap();

        assert_eq!(hits.get(), 1);
        assert_eq!(counts(&counters), vec![0, 0]);
        assert!(console.output().contains("debug!"));
        assert_eq!(banners(console.output(), "Start"), 2);
    }

    #[test]
    fn debug_switch_without_hook_just_redraws() {
        let (mut menu, _) = counting_menu(1, ShellConfig::default());
        let mut console = ScriptedConsole::new().keys("DC");
        menu.start(&mut console, false).unwrap();
        assert_eq!(banners(console.output(), "Start"), 2);
    }

    #[test]
    fn configured_switches_are_honored() {
        let config = ShellConfig {
            switches: Switches::new('q', '?').unwrap(),
            ..Default::default()
        };
        let (mut menu, _) = counting_menu(1, config);
        // 'C' is an ordinary invalid key now
        let mut console = ScriptedConsole::new().keys("Cq");
        menu.start(&mut console, false).unwrap();

        assert!(console.output().contains("or Q for top"));
        assert_eq!(console.output().matches(INVALID_ANSWER).count(), 1);
    }

    #[test]
    fn nested_menu_returns_to_parent_prompt() {
        let deep_hits = Rc::new(Cell::new(0));
        let hits = Rc::clone(&deep_hits);
        let config = ShellConfig::default();
        let deep_config = config.clone();

        let mut menu = Menu::new("Start", config).item(MenuItem::new("Go deeper", move |console| {
            let hits = Rc::clone(&hits);
            let mut deep = Menu::new("Deeper", deep_config.clone()).item(MenuItem::new(
                "Deep item",
                move |_| {
                    hits.set(hits.get() + 1);
                    Ok(())
                },
            ));
            deep.start(console, false)
        }));

        let mut console = ScriptedConsole::new().keys("11CC");
        menu.start(&mut console, false).unwrap();

        assert_eq!(deep_hits.get(), 1);
        assert_eq!(banners(console.output(), "Deeper"), 1);
        // Parent was not redrawn after the nested menu returned
        assert_eq!(banners(console.output(), "Start"), 1);
        assert_eq!(console.remaining(), 0);
    }

    #[test]
    fn action_errors_propagate() {
        let mut menu = Menu::new("Start", ShellConfig::default())
            .item(MenuItem::new("Fail", |_| Err(ShellError::action("boom"))));
        let mut console = ScriptedConsole::new().keys("1C");

        let err = menu.start(&mut console, false).unwrap_err();
        assert!(matches!(err, ShellError::Action(_)));
        assert_eq!(console.remaining(), 1);
    }

    #[test]
    fn lowercase_switch_given_to_constructor_still_exits() {
        let config = ShellConfig {
            switches: Switches::new('q', '!').unwrap(),
            ..Default::default()
        };
        let (mut menu, _) = counting_menu(1, config);
        let mut console = ScriptedConsole::new().key('q');
        menu.start(&mut console, false).unwrap();

        let (mut menu, _) = counting_menu(1, menu.config().clone());
        let mut console = ScriptedConsole::new().key('Q');
        menu.start(&mut console, false).unwrap();
        assert!(!console.output().contains(INVALID_ANSWER));
    }

    #[test]
    fn digit_debug_switch_cannot_shadow_selection() {
        assert!(Switches::new('q', '1').is_err());

        let (mut menu, counters) = counting_menu(1, ShellConfig::default());
        let mut console = ScriptedConsole::new().keys("1C");
        menu.start(&mut console, false).unwrap();
        assert_eq!(counts(&counters), vec![1]);
    }

    #[test]
    fn debug_hook_errors_propagate() {
        let config =
            ShellConfig::default().with_debug_hook(|_| Err(ShellError::action("hook failed")));
        let (mut menu, counters) = counting_menu(1, config);
        let mut console = ScriptedConsole::new().keys("DC");

        let err = menu.start(&mut console, false).unwrap_err();
        assert!(matches!(err, ShellError::Action(_)));
        assert_eq!(err.to_string(), "action failed: hook failed");
        assert_eq!(counts(&counters), vec![0]);
        assert_eq!(console.remaining(), 1);
    }

    #[test]
    fn no_op_item_is_selectable() {
        let mut menu = Menu::new("Start", ShellConfig::default()).item(MenuItem::no_op("Nothing"));
        let mut console = ScriptedConsole::new().keys("1C");
        menu.start(&mut console, false).unwrap();
        assert!(!console.output().contains(INVALID_ANSWER));
    }

    #[test]
    fn end_of_input_ends_the_loop() {
        let (mut menu, _) = counting_menu(1, ShellConfig::default());
        let mut console = ScriptedConsole::new().key('1');

        let err = menu.start(&mut console, false).unwrap_err();
        assert!(err.is_end_of_input());
    }

    #[test]
    fn line_selection_reaches_items_past_nine() {
        let config = ShellConfig {
            selection: SelectionMode::Line,
            ..Default::default()
        };
        let (mut menu, counters) = counting_menu(12, config);
        let mut console = ScriptedConsole::new().line("12").line("c");
        menu.start(&mut console, false).unwrap();

        assert_eq!(counters[11].get(), 1);
        assert_eq!(counts(&counters).iter().sum::<u32>(), 1);
    }

    #[test]
    fn run_uses_configured_new_screen() {
        let config = ShellConfig {
            new_screen: false,
            ..Default::default()
        };
        let (mut menu, _) = counting_menu(1, config);
        let mut console = ScriptedConsole::new().key('C');
        menu.run(&mut console).unwrap();
        assert_eq!(console.clears(), 0);
    }
}
