use crate::core::{
    command_init::BlameCommandInit, display::NOT_COMMITTED_YET, error::Result, output::print_info,
};
use std::path::Path;

/// Print the browsable URL of the commit that last touched `line`.
///
/// When no URL can be derived the session posts a notice suggesting the hash
/// instead; that is not an error.
pub async fn execute_link(file: &Path, line: usize) -> Result<()> {
    let context = BlameCommandInit::initialize(file, None).await?;
    context.select_line(line)?;

    if context
        .session
        .lookup_row(line - 1)
        .committed_annotation()
        .is_none()
    {
        print_info(NOT_COMMITTED_YET);
        return Ok(());
    }

    if let Some(url) = context.session.commit_link_at_cursor() {
        println!("{url}");
    }
    Ok(())
}

/// Print the short hash of the commit that last touched `line`
pub async fn execute_hash(file: &Path, line: usize) -> Result<()> {
    let context = BlameCommandInit::initialize(file, None).await?;
    context.select_line(line)?;

    match context.session.short_hash_at_cursor() {
        Some(hash) => println!("{hash}"),
        None => print_info(NOT_COMMITTED_YET),
    }
    Ok(())
}
