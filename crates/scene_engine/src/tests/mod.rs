//! Cross-module tests driving scenes the way an application does

mod hierarchy_integration;
