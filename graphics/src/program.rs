//! Linked shader program descriptions.
//!
//! The binding layer only needs the active vertex inputs of a program: their
//! names, the first hardware slot each occupies and how many consecutive
//! slots it spans (a 4x4 matrix input spans four).

use std::collections::HashSet;

use crate::error::BindingError;

vbind_core::define_id!(
    /// Identity of a linked program.
    ProgramId
);

/// One active vertex input of a program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramInput {
    /// Attribute name the input reads from.
    pub name: String,
    /// First hardware slot.
    pub location: u32,
    /// Consecutive slots occupied (1 to 4).
    pub location_size: u32,
}

impl ProgramInput {
    /// Input occupying a single slot.
    pub fn new(name: impl Into<String>, location: u32) -> Self {
        Self {
            name: name.into(),
            location,
            location_size: 1,
        }
    }

    /// Set the number of consecutive slots.
    pub fn with_location_size(mut self, location_size: u32) -> Self {
        self.location_size = location_size;
        self
    }

    /// One past the last slot used.
    pub fn end_location(&self) -> u32 {
        self.location + self.location_size
    }
}

/// A linked program's vertex interface.
#[derive(Debug, Clone)]
pub struct Program {
    id: ProgramId,
    label: Option<String>,
    inputs: Vec<ProgramInput>,
}

impl Program {
    /// Describe a program from its active inputs.
    pub fn new(inputs: Vec<ProgramInput>) -> Result<Self, BindingError> {
        let mut names = HashSet::new();
        for input in &inputs {
            if !(1..=4).contains(&input.location_size) {
                return Err(BindingError::InvalidProgram(format!(
                    "input '{}' spans {} slots",
                    input.name, input.location_size
                )));
            }
            if !names.insert(input.name.as_str()) {
                return Err(BindingError::InvalidProgram(format!(
                    "duplicate input '{}'",
                    input.name
                )));
            }
        }
        Ok(Self {
            id: ProgramId::new(),
            label: None,
            inputs,
        })
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Active inputs in declaration order.
    pub fn inputs(&self) -> &[ProgramInput] {
        &self.inputs
    }

    /// Active input named `name`.
    pub fn input(&self, name: &str) -> Option<&ProgramInput> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// Check every input fits within `max_slots` hardware slots.
    pub fn check_slots(&self, max_slots: u32) -> Result<(), BindingError> {
        match self.inputs.iter().find(|input| input.end_location() > max_slots) {
            Some(input) => Err(BindingError::SlotOutOfRange {
                input: input.name.clone(),
                location: input.location,
                location_size: input.location_size,
                max: max_slots,
            }),
            None => Ok(()),
        }
    }
}
