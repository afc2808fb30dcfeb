// Network interface selection. Resolved once at startup and once per config
// reload so momentary link flaps do not thrash the choice; a vanished
// auto-picked interface falls back to the next-best up interface mid-run.

use crate::config::Configuration;

/// Interface view used for selection decisions.
#[derive(Debug, Clone)]
pub struct IfaceInfo {
    pub name: String,
    /// Cumulative sent + received bytes.
    pub total_bytes: u64,
    pub is_up: bool,
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.starts_with("Loopback")
}

fn pick_busiest(ifaces: &[IfaceInfo]) -> Option<String> {
    ifaces
        .iter()
        .filter(|i| i.is_up && !is_loopback(&i.name))
        .max_by_key(|i| (i.total_bytes, std::cmp::Reverse(i.name.clone())))
        .map(|i| i.name.clone())
}

#[derive(Debug, Clone, PartialEq)]
pub enum NicSelector {
    /// Single interface; `auto` re-resolves when the pick disappears.
    Single { name: Option<String>, auto: bool },
    /// Explicit set, in configured order.
    Multi { names: Vec<String> },
}

impl NicSelector {
    pub fn resolve(cfg: &Configuration, ifaces: &[IfaceInfo]) -> Self {
        if let Some(list) = &cfg.net_ifaces {
            let names = if list.iter().any(|n| n.eq_ignore_ascii_case("auto")) {
                let mut all: Vec<String> = ifaces
                    .iter()
                    .filter(|i| i.is_up && !is_loopback(&i.name))
                    .map(|i| i.name.clone())
                    .collect();
                all.sort();
                all
            } else {
                list.iter()
                    .filter(|n| ifaces.iter().any(|i| i.name == **n))
                    .cloned()
                    .collect()
            };
            return NicSelector::Multi { names };
        }

        let configured = cfg.net_iface.trim();
        if configured.eq_ignore_ascii_case("auto") {
            NicSelector::Single {
                name: pick_busiest(ifaces),
                auto: true,
            }
        } else {
            NicSelector::Single {
                name: ifaces
                    .iter()
                    .any(|i| i.name == configured)
                    .then(|| configured.to_string()),
                auto: false,
            }
        }
    }

    /// Interface names to sample this tick, re-resolving a vanished auto pick.
    pub fn selected(&mut self, ifaces: &[IfaceInfo]) -> Vec<String> {
        match self {
            NicSelector::Single { name, auto } => {
                if *auto {
                    let still_present = name
                        .as_ref()
                        .is_some_and(|n| ifaces.iter().any(|i| i.name == *n));
                    if !still_present {
                        *name = pick_busiest(ifaces);
                    }
                }
                name.iter().cloned().collect()
            }
            NicSelector::Multi { names } => names.clone(),
        }
    }
}
