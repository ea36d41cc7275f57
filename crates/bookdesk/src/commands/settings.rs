//! Key/value settings command handlers.

use tabled::Tabled;

use bookdesk_core::api::Setting;
use bookdesk_core::{Console, DeleteOptions, SettingForm, SettingList};

use crate::cli::{GlobalOpts, ListArgs, SettingsArgs, SettingsCommand};
use crate::error::CliError;

use super::resource::{self, CliForm, CliResource};
use super::util;

#[derive(Tabled)]
pub struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

const VALUE_WIDTH: usize = 60;

impl From<&Setting> for SettingRow {
    fn from(s: &Setting) -> Self {
        let value = if s.setting_value.chars().count() > VALUE_WIDTH {
            let cut: String = s.setting_value.chars().take(VALUE_WIDTH - 1).collect();
            format!("{cut}…")
        } else {
            s.setting_value.clone()
        };
        Self {
            key: s.setting_key.clone(),
            value,
        }
    }
}

impl CliResource for SettingList {
    type Form = SettingForm;
    type Row = SettingRow;

    fn row(item: &Setting) -> SettingRow {
        SettingRow::from(item)
    }

    fn detail(s: &Setting) -> String {
        format!("{} = {}", s.setting_key, s.setting_value)
    }
}

impl CliForm for SettingForm {}

pub async fn handle(console: &Console, args: SettingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::List { query } => {
            let list = ListArgs {
                query,
                ..ListArgs::default()
            };
            resource::list::<SettingList>(console, &list, &[], global).await
        }

        SettingsCommand::Set { key, value } => set(console, &key, value, global).await,

        SettingsCommand::Delete { key } => {
            resource::delete::<SettingList>(console, &key, DeleteOptions::default(), global).await
        }
    }
}

/// Upsert: edit the existing entry when the key is known, else create it.
async fn set(console: &Console, key: &str, value: String, global: &GlobalOpts) -> Result<(), CliError> {
    let mut form = console.form::<SettingForm>();
    match resource::find_in_list::<SettingList>(console, key).await {
        Ok(existing) => form.open_edit(existing).await,
        Err(CliError::NotFound { .. }) => {
            form.open_create().await;
            form.set_text("key", key)?;
        }
        Err(e) => return Err(e),
    }
    form.set_text("value", value)?;

    let pb = util::spinner(global, format!("Saving setting {key}"));
    let saved = form.submit().await;
    pb.finish_and_clear();
    saved.map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_values_are_cut_in_tables() {
        let setting = Setting {
            setting_key: "footer_html".into(),
            setting_value: "x".repeat(200),
        };
        let row = SettingRow::from(&setting);
        assert_eq!(row.value.chars().count(), VALUE_WIDTH);
        assert!(row.value.ends_with('…'));
    }
}
