//! Mock implementations of decoder collaborators.
