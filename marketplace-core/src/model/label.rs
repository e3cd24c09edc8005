//! Display labels shown next to plugins in the marketplace UI
//!
//! Labels are never trusted from the registry. They are derived from the
//! record's classification fields every time a record is served.

use serde::{Deserialize, Serialize};

use super::plugin::{AuthorType, Plugin, ReleaseStage};

/// A label rendered by marketplace clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub color: String,
}

/// Every label the marketplace can attach to a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Official,
    Partner,
    Community,
    Beta,
    Enterprise,
}

/// All label kinds in display order
pub const ALL_LABELS: [LabelKind; 5] = [
    LabelKind::Official,
    LabelKind::Partner,
    LabelKind::Community,
    LabelKind::Beta,
    LabelKind::Enterprise,
];

impl LabelKind {
    pub fn label(self) -> Label {
        let (name, description, url) = match self {
            LabelKind::Official => (
                "Official",
                "This plugin is maintained by Mattermost",
                "https://mattermost.com/pl/default-mattermost-plugins",
            ),
            LabelKind::Partner => (
                "Partner",
                "This plugin is maintained by a Mattermost partner",
                "https://mattermost.com/pl/default-partner-plugins",
            ),
            LabelKind::Community => (
                "Community",
                "This plugin is maintained by the Open Source Community",
                "https://mattermost.com/pl/default-community-plugins",
            ),
            LabelKind::Beta => (
                "Beta",
                "This plugin is currently in beta and is not recommended for use in production",
                "https://mattermost.com/pl/default-beta-plugins",
            ),
            LabelKind::Enterprise => (
                "Enterprise",
                "This plugin only works on Enterprise Edition",
                "https://mattermost.com/pl/default-enterprise-plugins",
            ),
        };

        Label {
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
            color: String::new(),
        }
    }
}

/// The full label catalogue, in display order
pub fn all_labels() -> Vec<Label> {
    ALL_LABELS.iter().map(|kind| kind.label()).collect()
}

/// Labels a record should carry, computed from its author, stage and enterprise flag
pub fn derive_labels(plugin: &Plugin) -> Vec<Label> {
    let author = plugin.author_type.map(|author| match author {
        AuthorType::Mattermost => LabelKind::Official,
        AuthorType::Partner => LabelKind::Partner,
        AuthorType::Community => LabelKind::Community,
    });
    let beta = (plugin.release_stage == ReleaseStage::Beta).then_some(LabelKind::Beta);
    let enterprise = plugin.enterprise.then_some(LabelKind::Enterprise);

    [author, beta, enterprise]
        .into_iter()
        .flatten()
        .map(LabelKind::label)
        .collect()
}
