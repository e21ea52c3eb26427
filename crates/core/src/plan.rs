//! Print plans: projects made of plates, each plate needing filaments.
//!
//! Plans are TOML files the user edits by hand:
//!
//! ```toml
//! [[projects]]
//! name = "Desk Organizer"
//!
//! [[projects.plates]]
//! name = "Tray"
//! [[projects.plates.needs]]
//! filament_id = 12
//! name = "PLA Basic Black"
//! amount = 84.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PlanError;
use crate::spool::FilamentId;

/// Progress of a project or plate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl Status {
    pub fn is_completed(self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Todo => write!(f, "todo"),
            Status::InProgress => write!(f, "in-progress"),
            Status::Completed => write!(f, "completed"),
        }
    }
}

/// One filament requirement of a plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateRequirement {
    /// 0 means "not yet linked to a filament product"
    #[serde(default)]
    pub filament_id: FilamentId,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub material: String,

    /// Grams required
    #[serde(default)]
    pub amount: f64,
}

impl PlateRequirement {
    pub fn new(filament_id: FilamentId, amount: f64) -> Self {
        Self {
            filament_id,
            amount,
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.filament_id != 0
    }

    /// A human label: the name if known, otherwise the filament ID.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("filament #{}", self.filament_id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub name: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub needs: Vec<PlateRequirement>,
}

impl Plate {
    pub fn is_pending(&self) -> bool {
        !self.status.is_completed()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub plates: Vec<Plate>,
}

impl Project {
    pub fn is_pending(&self) -> bool {
        !self.status.is_completed()
    }

    /// Mark one plate completed; the project completes with its last plate.
    pub fn complete_plate(&mut self, plate: usize) -> Result<(), PlanError> {
        let p = self.plates.get_mut(plate).ok_or(PlanError::PlateNotFound {
            project: 0,
            plate,
        })?;
        p.status = Status::Completed;
        if self.plates.iter().all(|p| p.status.is_completed()) {
            self.status = Status::Completed;
        } else if self.status == Status::Todo {
            self.status = Status::InProgress;
        }
        Ok(())
    }
}

/// The contents of one plan file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl PlanFile {
    /// Every project is completed (a plan with no projects is not).
    pub fn is_finished(&self) -> bool {
        !self.projects.is_empty() && self.projects.iter().all(|p| p.status.is_completed())
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, PlanError> {
        toml::from_str(content).map_err(|e| PlanError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn to_toml_string(&self, path: &Path) -> Result<String, PlanError> {
        toml::to_string_pretty(self).map_err(|e| PlanError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a plan file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Rewrite the whole file.
    pub fn save(&self, path: &Path) -> Result<(), PlanError> {
        let content = self.to_toml_string(path)?;
        std::fs::write(path, content).map_err(|e| PlanError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Iterate `(project index, plate index, project, plate)` over every
    /// not-completed plate of every not-completed project.
    pub fn pending_plates(&self) -> impl Iterator<Item = (usize, usize, &Project, &Plate)> {
        self.projects
            .iter()
            .enumerate()
            .filter(|(_, proj)| proj.is_pending())
            .flat_map(|(i, proj)| {
                proj.plates
                    .iter()
                    .enumerate()
                    .filter(|(_, plate)| plate.is_pending())
                    .map(move |(j, plate)| (i, j, proj, plate))
            })
    }

    pub fn plate(&self, project: usize, plate: usize) -> Option<&Plate> {
        self.projects.get(project)?.plates.get(plate)
    }

    /// Mark a plate completed (and its project, if it was the last one).
    pub fn complete_plate(&mut self, project: usize, plate: usize) -> Result<(), PlanError> {
        let proj = self
            .projects
            .get_mut(project)
            .ok_or(PlanError::PlateNotFound { project, plate })?;
        proj.complete_plate(plate)
            .map_err(|_| PlanError::PlateNotFound { project, plate })
    }
}
