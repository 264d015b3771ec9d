// Setup form state: the four text fields typed before a raffle starts.

use raffle_core::config::FormDefaults;
use raffle_core::protocol::UserCommand;

/// A field of the setup form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Start,
    End,
    Total,
    Exceptions,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Start,
        FormField::End,
        FormField::Total,
        FormField::Exceptions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Start => "Start number",
            FormField::End => "End number",
            FormField::Total => "Total draws",
            FormField::Exceptions => "Exceptions",
        }
    }

    pub fn next(self) -> FormField {
        match self {
            FormField::Start => FormField::End,
            FormField::End => FormField::Total,
            FormField::Total => FormField::Exceptions,
            FormField::Exceptions => FormField::Start,
        }
    }

    pub fn prev(self) -> FormField {
        match self {
            FormField::Start => FormField::Exceptions,
            FormField::End => FormField::Start,
            FormField::Total => FormField::End,
            FormField::Exceptions => FormField::Total,
        }
    }

    /// Characters that can be typed into this field. Anything else is
    /// dropped before it reaches the text.
    fn accepts(self, c: char) -> bool {
        match self {
            FormField::Exceptions => c.is_ascii_digit() || matches!(c, '-' | ',' | ' '),
            _ => c.is_ascii_digit() || c == '-',
        }
    }
}

/// Raw text of the setup form. Validation happens in the engine on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupForm {
    pub start: String,
    pub end: String,
    pub total: String,
    /// Comma-separated, e.g. `5, 10, 15`.
    pub exceptions: String,
    pub focus: FormField,
}

impl SetupForm {
    pub fn new(defaults: &FormDefaults) -> Self {
        SetupForm {
            start: defaults.start.to_string(),
            end: defaults.end.to_string(),
            total: defaults.total.to_string(),
            exceptions: String::new(),
            focus: FormField::Start,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Start => &self.start,
            FormField::End => &self.end,
            FormField::Total => &self.total,
            FormField::Exceptions => &self.exceptions,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Start => &mut self.start,
            FormField::End => &mut self.end,
            FormField::Total => &mut self.total,
            FormField::Exceptions => &mut self.exceptions,
        }
    }

    /// Append `c` to the focused field. Returns false when the field does
    /// not accept the character.
    pub fn insert(&mut self, c: char) -> bool {
        if !self.focus.accepts(c) {
            return false;
        }
        self.value_mut(self.focus).push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.value_mut(self.focus).pop();
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// The submit command carrying the form text as typed.
    pub fn to_command(&self) -> UserCommand {
        UserCommand::Configure {
            start: self.start.clone(),
            end: self.end.clone(),
            total: self.total.clone(),
            exceptions: self.exceptions.clone(),
        }
    }
}

impl Default for SetupForm {
    fn default() -> Self {
        SetupForm::new(&raffle_core::config::Config::default().form)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
