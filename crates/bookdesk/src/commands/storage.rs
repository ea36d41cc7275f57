//! Storage command handlers: raw uploads and key resolution.

use bytesize::ByteSize;
use serde::Serialize;

use bookdesk_core::api::StorageCategory;
use bookdesk_core::upload::resolve_display_url;
use bookdesk_core::{Console, CoreError, LocalFile};

use crate::cli::{GlobalOpts, StorageArgs, StorageCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct Uploaded {
    key: String,
    category: StorageCategory,
    name: String,
    size: u64,
}

#[derive(Debug, Serialize)]
struct Resolved {
    key: String,
    url: String,
}

pub async fn handle(console: &Console, args: StorageArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StorageCommand::Upload {
            path,
            category,
            key,
        } => {
            let file = LocalFile::from_path(&path)?;
            let size = u64::try_from(file.bytes.len()).unwrap_or(u64::MAX);

            let pb = util::spinner(global, format!("Uploading {} ({})", file.name, ByteSize(size)));
            let stored = console
                .client()
                .upload(&file.to_upload(), category, key.as_deref())
                .await;
            pb.finish_and_clear();

            let uploaded = Uploaded {
                key: stored.map_err(CoreError::from)?,
                category,
                name: file.name,
                size,
            };
            let out = output::render_single(
                global.output,
                &uploaded,
                |u| {
                    format!(
                        "Key:       {}\nCategory:  {}\nFile:      {} ({})",
                        u.key,
                        u.category,
                        u.name,
                        ByteSize(u.size)
                    )
                },
                |u| u.key.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StorageCommand::Url { key } => {
            let url = resolve_display_url(console.client(), &key).await?;
            let resolved = Resolved { key, url };
            let out = output::render_single(
                global.output,
                &resolved,
                |r| r.url.clone(),
                |r| r.url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
