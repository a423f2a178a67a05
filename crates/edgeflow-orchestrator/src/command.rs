//! Execution-type to command-line matching.

use edgeflow_core::types::{ExecutionType, ExecutionVariant};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Select the command line for the winning device's execution type.
///
/// Variants are scanned in the order the caller supplied them; the first
/// one whose type matches wins, so duplicate types are resolved by
/// position.
pub fn match_command(
    execution_type: ExecutionType,
    variants: &[ExecutionVariant],
) -> OrchestratorResult<&[String]> {
    variants
        .iter()
        .find(|variant| variant.execution_type == execution_type)
        .map(|variant| variant.command.as_slice())
        .ok_or(OrchestratorError::CommandMismatch(execution_type))
}
