// ── Domain → action table ──
//
// Which service "opens" a control depends only on the entity's domain.
// The table is closed: anything not listed resolves to
// `OpenResolution::UnsupportedDomain` instead of silently doing nothing.

use std::str::FromStr;

use strum::{Display, EnumString};

use super::Command;
use crate::model::EntityId;

/// Entity domains the card knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ActionDomain {
    Script,
    Lock,
    Switch,
    InputBoolean,
    Cover,
}

impl ActionDomain {
    /// Service invoked to open an entity of this domain.
    pub fn open_service(self) -> &'static str {
        match self {
            Self::Script => "turn_on",
            Self::Lock => "unlock",
            Self::Switch | Self::InputBoolean => "toggle",
            Self::Cover => "open_cover",
        }
    }

    fn open_command(self, entity: EntityId) -> Command {
        match self {
            Self::Script => Command::RunScript { entity },
            Self::Lock => Command::Unlock { entity },
            Self::Switch | Self::InputBoolean => Command::Toggle { entity },
            Self::Cover => Command::OpenCover { entity },
        }
    }
}

/// Outcome of looking an entity up in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenResolution {
    Dispatch(Command),
    UnsupportedDomain { domain: String },
}

/// Resolve the command that opens `entity`.
pub fn resolve_open(entity: &EntityId) -> OpenResolution {
    match ActionDomain::from_str(entity.domain()) {
        Ok(domain) => OpenResolution::Dispatch(domain.open_command(entity.clone())),
        Err(_) => OpenResolution::UnsupportedDomain {
            domain: entity.domain().to_owned(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open(raw: &str) -> OpenResolution {
        resolve_open(&EntityId::parse(raw).unwrap())
    }

    #[test]
    fn table_matches_services() {
        let cases = [
            ("script.open_gate", "script", "turn_on"),
            ("lock.gate", "lock", "unlock"),
            ("switch.gate_relay", "switch", "toggle"),
            ("input_boolean.gate", "input_boolean", "toggle"),
            ("cover.building_door", "cover", "open_cover"),
        ];
        for (entity, domain, service) in cases {
            let OpenResolution::Dispatch(cmd) = open(entity) else {
                panic!("{entity} should resolve");
            };
            assert_eq!(cmd.domain(), domain, "{entity}");
            assert_eq!(cmd.service(), service, "{entity}");
            assert_eq!(cmd.entity().as_str(), entity);
        }
    }

    #[test]
    fn unknown_domain_is_reported() {
        assert_eq!(
            open("light.porch"),
            OpenResolution::UnsupportedDomain {
                domain: "light".into()
            }
        );
    }

    #[test]
    fn domain_names_are_snake_case() {
        assert_eq!(ActionDomain::InputBoolean.to_string(), "input_boolean");
        assert_eq!(ActionDomain::Cover.open_service(), "open_cover");
    }
}
