//! Sequential input forms with a correction loop.
//!
//! Every field is prompted in order until its validator accepts the
//! line. The user may then correct single fields by number before the
//! form finishes.
//!
//! States: `Collecting` → `ReviewPrompt` → (`Correcting` → `ReviewPrompt`)* → `Done`.

use std::fmt;
use std::io;

use log::debug;
use serde::Serialize;

use crate::console::{print_title, Console};
use crate::error::ShellResult;
use crate::types::{to_upper, CancelBehavior, ShellConfig};

/// Message printed for a rejected value or an unusable answer.
pub const INVALID_INPUT: &str = "Invalid input.";

const REVIEW_PROMPT: &str = "Would you like to make corrections? (Y/n) ";

// ============================================================================
// ITEMS
// ============================================================================

/// Predicate deciding whether a line is an acceptable field value.
pub type Validator = Box<dyn Fn(&str) -> bool>;

/// A labeled field holding the last value its validator accepted.
pub struct FormItem {
    pub label: String,
    /// Redraw the form (with current values) after this field is corrected.
    pub refresh_after_action: bool,
    validate: Validator,
    input: Option<String>,
}

impl FormItem {
    pub fn new<F>(label: impl Into<String>, validate: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Self {
            label: label.into(),
            refresh_after_action: false,
            validate: Box::new(validate),
            input: None,
        }
    }

    /// A field accepting any line, including an empty one.
    pub fn any(label: impl Into<String>) -> Self {
        Self::new(label, |_| true)
    }

    pub fn refresh(mut self, refresh_after_action: bool) -> Self {
        self.refresh_after_action = refresh_after_action;
        self
    }

    pub fn is_valid(&self, value: &str) -> bool {
        (self.validate)(value)
    }

    /// Store `value` if the validator accepts it. Returns whether it did.
    pub fn offer(&mut self, value: String) -> bool {
        if self.is_valid(&value) {
            self.input = Some(value);
            true
        } else {
            false
        }
    }

    /// The accepted value, if one was entered yet.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }
}

impl fmt::Debug for FormItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormItem")
            .field("label", &self.label)
            .field("refresh_after_action", &self.refresh_after_action)
            .field("input", &self.input)
            .finish()
    }
}

/// A field's label and value, for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub label: String,
    pub value: String,
}

// ============================================================================
// ANSWER DECODING
// ============================================================================

/// Answer to "Would you like to make corrections?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAnswer {
    /// Y or Enter.
    Correct,
    /// N.
    Finish,
    Unrecognized,
}

pub fn decode_review(key: char) -> ReviewAnswer {
    match to_upper(key) {
        'Y' | '\n' | '\r' => ReviewAnswer::Correct,
        'N' => ReviewAnswer::Finish,
        _ => ReviewAnswer::Unrecognized,
    }
}

/// Answer to "Which field to correct?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Empty line: ask the review question again.
    Reprompt,
    Cancel,
    /// Zero-based index of the field to re-enter.
    Field(usize),
    Invalid,
}

/// Decode the correction answer.
///
/// A line starting with the cancel token (any case) cancels; otherwise
/// it must be an integer in `1..=item_count`, surrounding spaces allowed.
pub fn decode_correction(line: &str, cancel: char, item_count: usize) -> Correction {
    let Some(first) = line.chars().next() else {
        return Correction::Reprompt;
    };

    if to_upper(first) == cancel {
        return Correction::Cancel;
    }

    match line.trim().parse::<i64>() {
        Ok(n) if n >= 1 && (n as u64) <= item_count as u64 => Correction::Field(n as usize - 1),
        _ => Correction::Invalid,
    }
}

// ============================================================================
// STATES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Collecting,
    ReviewPrompt,
    Correcting(usize),
    Done,
}

// ============================================================================
// FORM
// ============================================================================

pub struct Form {
    pub title: String,
    items: Vec<FormItem>,
    config: ShellConfig,
}

impl Form {
    pub fn new(title: impl Into<String>, config: ShellConfig) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            config,
        }
    }

    pub fn with_items(title: impl Into<String>, config: ShellConfig, items: Vec<FormItem>) -> Self {
        Self {
            title: title.into(),
            items,
            config,
        }
    }

    /// Builder form of [`Form::add_item`].
    pub fn item(mut self, item: FormItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_item(&mut self, item: FormItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[FormItem] {
        &self.items
    }

    /// Current values in field order; fields never filled read as "".
    pub fn values(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.input().unwrap_or_default().to_string())
            .collect()
    }

    /// Current values paired with their labels.
    pub fn field_values(&self) -> Vec<FieldValue> {
        self.items
            .iter()
            .map(|item| FieldValue {
                label: item.label.clone(),
                value: item.input().unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Run the form, clearing the screen per the configuration.
    pub fn run(&mut self, console: &mut dyn Console) -> ShellResult<Vec<String>> {
        let new_screen = self.config.new_screen;
        self.start(console, new_screen)
    }

    /// Collect every field, then offer corrections until the user declines.
    ///
    /// Returns the final values, each accepted by its field's validator.
    pub fn start(&mut self, console: &mut dyn Console, new_screen: bool) -> ShellResult<Vec<String>> {
        let mut state = FormState::Collecting;

        loop {
            debug!("form {:?}: {:?}", self.title, state);
            state = match state {
                FormState::Collecting => {
                    print_title(console, &self.title, new_screen)?;
                    for index in 0..self.items.len() {
                        self.collect_field(console, index)?;
                    }
                    FormState::ReviewPrompt
                }
                FormState::ReviewPrompt => self.review(console)?,
                FormState::Correcting(index) => {
                    self.collect_field(console, index)?;
                    if self.items[index].refresh_after_action {
                        self.redraw(console, new_screen)?;
                    }
                    FormState::ReviewPrompt
                }
                FormState::Done => return Ok(self.values()),
            };
        }
    }

    /// Prompt for one field until its validator accepts the line.
    fn collect_field(&mut self, console: &mut dyn Console, index: usize) -> io::Result<()> {
        let item = &mut self.items[index];
        let prompt = format!("    {}. {}: ", index + 1, item.label);

        loop {
            console.write(&prompt)?;
            let line = console.read_line()?;
            if item.offer(line) {
                return Ok(());
            }
            console.write_line(INVALID_INPUT)?;
        }
    }

    /// Ask whether to correct anything and decide the next state.
    fn review(&mut self, console: &mut dyn Console) -> io::Result<FormState> {
        console.write(REVIEW_PROMPT)?;
        let key = console.read_key()?;
        console.write_line("")?;

        match decode_review(key) {
            ReviewAnswer::Finish => Ok(FormState::Done),
            ReviewAnswer::Unrecognized => {
                console.write_line(INVALID_INPUT)?;
                Ok(FormState::ReviewPrompt)
            }
            ReviewAnswer::Correct => {
                let cancel = self.config.switches.go_up();
                console.write(&format!(
                    "Which field to correct? (1 ...{}, {} to cancel) ",
                    self.items.len(),
                    cancel
                ))?;
                let line = console.read_line()?;

                Ok(match decode_correction(&line, cancel, self.items.len()) {
                    Correction::Reprompt => FormState::ReviewPrompt,
                    Correction::Cancel => match self.config.on_cancel {
                        CancelBehavior::Finish => FormState::Done,
                        CancelBehavior::Restart => FormState::Collecting,
                    },
                    Correction::Invalid => {
                        console.write_line(INVALID_INPUT)?;
                        FormState::ReviewPrompt
                    }
                    Correction::Field(index) => FormState::Correcting(index),
                })
            }
        }
    }

    /// Reprint the banner and every field with its current value.
    fn redraw(&self, console: &mut dyn Console, new_screen: bool) -> io::Result<()> {
        print_title(console, &self.title, new_screen)?;
        for (i, item) in self.items.iter().enumerate() {
            console.write_line(&format!(
                "    {}. {}: {}",
                i + 1,
                item.label,
                item.input().unwrap_or_default()
            ))?;
        }
        console.write_line("")
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("title", &self.title)
            .field("items", &self.items)
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
