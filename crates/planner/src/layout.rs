//! Printers, their slots, and slot capacities.

use spoolctl_config::{AppConfig, DEFAULT_CAPACITY};
use spoolctl_core::error::PlanError;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct PrinterLayout {
    printers: BTreeMap<String, Vec<String>>,
    capacity: HashMap<String, u32>,
}

impl PrinterLayout {
    pub fn new(printers: BTreeMap<String, Vec<String>>, capacity: HashMap<String, u32>) -> Self {
        Self { printers, capacity }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.printers.clone(), config.location_capacity.clone())
    }

    pub fn printer_names(&self) -> Vec<&str> {
        self.printers.keys().map(String::as_str).collect()
    }

    /// The slots of `printer`, in declared order.
    pub fn slots(&self, printer: &str) -> Result<&[String], PlanError> {
        self.printers
            .get(printer)
            .map(Vec::as_slice)
            .ok_or_else(|| PlanError::UnknownPrinter(printer.to_string()))
    }

    /// Declared capacity of `location`, 1 when undeclared.
    pub fn capacity(&self, location: &str) -> usize {
        self.capacity
            .get(location)
            .copied()
            .unwrap_or(DEFAULT_CAPACITY)
            .max(1) as usize
    }

    /// The printer owning `location`, if it is a printer slot.
    pub fn printer_of(&self, location: &str) -> Option<&str> {
        if location.is_empty() {
            return None;
        }
        self.printers
            .iter()
            .find(|(_, slots)| slots.iter().any(|s| s == location))
            .map(|(name, _)| name.as_str())
    }

    pub fn is_printer_slot(&self, location: &str) -> bool {
        self.printer_of(location).is_some()
    }
}
