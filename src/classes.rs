//! Class Map Module
//!
//! The class map is the bijective mapping between disease class names and the
//! integer indices the classifier emits. It is loaded once at startup from the
//! same JSON table the model was trained with and stays fixed for the process
//! lifetime.

use std::collections::HashMap;
use std::path::Path;

use crate::utils::error::{LeafsightError, Result};

/// Bijective mapping between class names and classifier output indices.
///
/// Construction validates that the indices exactly cover `0..len` with no
/// duplicates, so both lookup directions are total over the declared range.
#[derive(Debug, Clone)]
pub struct ClassMap {
    /// Class names ordered by index; position i holds the name for index i
    names: Vec<String>,
}

impl ClassMap {
    /// Build a class map from a name -> index table, validating bijectivity.
    pub fn new(table: HashMap<String, usize>) -> Result<Self> {
        if table.is_empty() {
            return Err(LeafsightError::ConfigIntegrity(
                "class map is empty".to_string(),
            ));
        }

        let num_classes = table.len();
        let mut names: Vec<Option<String>> = vec![None; num_classes];

        for (name, index) in table {
            if index >= num_classes {
                return Err(LeafsightError::ConfigIntegrity(format!(
                    "class '{}' has index {} outside 0..{}",
                    name, index, num_classes
                )));
            }
            if let Some(existing) = &names[index] {
                return Err(LeafsightError::ConfigIntegrity(format!(
                    "classes '{}' and '{}' share index {}",
                    existing, name, index
                )));
            }
            names[index] = Some(name);
        }

        // Every slot is filled once indices are unique and in range.
        let names = names.into_iter().map(|n| n.unwrap()).collect();

        Ok(Self { names })
    }

    /// Load a class map from a JSON file containing a name -> index object.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table: HashMap<String, usize> = serde_json::from_str(&json)?;
        Self::new(table)
    }

    /// Get the class name for a classifier output index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// Get the index for a class name
    pub fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All class names, ordered by index
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the map is empty (never true for a validated map)
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
