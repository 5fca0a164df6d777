use serde::{Deserialize, Serialize};

/// What caused an engagement.
///
/// Closed set. `Unknown` is the fallback whenever no live tag can supply a
/// classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    #[default]
    Unknown,
    /// Direct hostile action by another player
    Player,
    /// Direct hostile action by a non-player creature
    Mob,
    /// Damage without a more specific classification
    Damage,
    /// Splash or area-of-effect damage
    AreaEffect,
    /// Lava, falling, drowning and the like. Usually has no opponent.
    Environment,
}

impl TagType {
    pub const ALL: [TagType; 6] = [
        TagType::Unknown,
        TagType::Player,
        TagType::Mob,
        TagType::Damage,
        TagType::AreaEffect,
        TagType::Environment,
    ];

    /// Stable lowercase label, matches the serde representation.
    pub fn label(self) -> &'static str {
        match self {
            TagType::Unknown => "unknown",
            TagType::Player => "player",
            TagType::Mob => "mob",
            TagType::Damage => "damage",
            TagType::AreaEffect => "area_effect",
            TagType::Environment => "environment",
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        kind: TagType,
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(TagType::default(), TagType::Unknown);
    }

    #[test]
    fn test_label_matches_serde_name() {
        for tag_type in TagType::ALL {
            let doc = format!("kind = \"{}\"", tag_type.label());
            let parsed: Wrapper = toml::from_str(&doc).unwrap();
            assert_eq!(parsed.kind, tag_type, "label {} did not round trip", tag_type);
        }
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result: Result<Wrapper, _> = toml::from_str("kind = \"lightning\"");
        assert!(result.is_err());
    }
}
