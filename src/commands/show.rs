use crate::core::{
    command_init::BlameCommandInit,
    display::NOT_COMMITTED_YET,
    error::Result,
    output::{print_commit_detail, print_info},
};
use std::path::Path;

pub async fn execute_show(file: &Path, line: usize, date_format: Option<&str>) -> Result<()> {
    let context = BlameCommandInit::initialize(file, date_format).await?;
    context.select_line(line)?;

    let Some(annotation) = context
        .session
        .lookup_row(line - 1)
        .committed_annotation()
        .cloned()
    else {
        print_info(NOT_COMMITTED_YET);
        return Ok(());
    };

    match context.session.commit_detail_at_cursor().await {
        Some(detail) => print_commit_detail(&annotation.revision_id, &detail),
        None => print_info(&format!(
            "Could not read commit {}",
            annotation.short_hash()
        )),
    }
    Ok(())
}
