//! `query` command.

use super::CriteriaArgs;

/// Print the expert query built from the criteria flags.
pub fn cmd_query(criteria: &CriteriaArgs) -> anyhow::Result<()> {
    println!("{}", criteria.to_query().build());
    Ok(())
}
