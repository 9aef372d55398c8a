//! Night action resolution
//!
//! Submissions are resolved in a fixed precedence over a snapshot of the
//! roster taken before anything dies:
//!
//! 1. Escort blocks
//! 2. Doctor protection
//! 3. Sheriff investigation
//! 4. Peeper watching
//! 5. Escort confirmations
//! 6. The Bandit kill (at most one per night)
//! 7. The Gunslinger's shot, which ignores protection
//!
//! The resolver is pure: roster and submissions in, new roster, public log,
//! private outcomes and a reset submission table out.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::util::rng::{choose, RandomSource};

use super::player::{self, DeathCause, Player, PlayerId};
use super::r#match::SubmissionTable;
use super::role::{Appearance, Faction, Role, GUNSLINGER_BULLETS};

pub const QUIET_NIGHT: &str = "The night was quiet. Nobody died.";
pub const ATTACK_THWARTED: &str = "Someone was attacked but saved by the Doctor!";

/// Whether lethal roles act tonight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightMode {
    Full,
    /// First night with kills disabled: only information roles resolve
    InformationOnly,
}

/// Why a kill or order did not land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The Doctor protected the target
    Protected,
    /// The target is a fellow Bandit
    SameFaction,
    /// Every Gunman was blocked
    NoExecutor,
}

/// Result delivered privately to one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrivateOutcome {
    ProtectionResult {
        target_name: String,
    },
    ProtectionSuccessful {
        target_name: String,
    },
    ProtectionBlocked,
    InvestigationResult {
        target_name: String,
        result: Appearance,
    },
    InvestigationBlocked,
    BlockResult {
        target_name: String,
    },
    BlockBlocked,
    PeepResult {
        target_name: String,
        visitors: Vec<String>,
    },
    PeepBlocked,
    KillSuccess {
        target_name: String,
    },
    KillFailed {
        target_name: String,
        reason: FailureReason,
    },
    KillBlocked,
    NotSelected,
    OrderSuccess {
        target_name: String,
    },
    OrderFailed {
        target_name: String,
        reason: FailureReason,
    },
    OrderBlocked,
    OutOfBullets,
    ActionSuppressed {
        message: String,
    },
}

/// Everything a night produces
#[derive(Debug, Clone, PartialEq)]
pub struct NightResolution {
    pub players: Vec<Player>,
    pub night_events: Vec<String>,
    pub private_events: BTreeMap<PlayerId, PrivateOutcome>,
    pub role_data: SubmissionTable,
}

impl NightResolution {
    pub fn deaths(&self, before: &[Player]) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.is_alive)
            .filter(|p| player::find(before, &p.id).map_or(false, |b| b.is_alive))
            .map(|p| p.id.clone())
            .collect()
    }
}

/// A submission that survived validation against the snapshot
#[derive(Debug, Clone, Copy)]
struct Action<'a> {
    actor: &'a Player,
    role: Role,
    target: &'a Player,
}

struct Night<'a> {
    snapshot: &'a [Player],
    roster: Vec<Player>,
    actions: Vec<Action<'a>>,
    blocked: HashSet<&'a str>,
    /// target id -> protecting doctors
    protected: HashMap<&'a str, Vec<&'a str>>,
    events: Vec<String>,
    outcomes: BTreeMap<PlayerId, PrivateOutcome>,
}

/// Resolve one night
pub fn resolve(
    players: &[Player],
    submissions: &SubmissionTable,
    mode: NightMode,
    rng: &mut (impl RandomSource + ?Sized),
) -> NightResolution {
    let mut night = Night::new(players, submissions);

    if mode == NightMode::InformationOnly {
        night.suppress_lethal();
    }

    night.collect_blocks();
    night.protect();
    night.investigate();
    night.watch();
    night.confirm_blocks();
    night.faction_kill(rng);
    night.gunslinger_shots();
    night.finish()
}

impl<'a> Night<'a> {
    fn new(snapshot: &'a [Player], submissions: &SubmissionTable) -> Self {
        let actions = submissions
            .targeted()
            .filter_map(|s| {
                let actor = player::find(snapshot, &s.actor_id)?;
                let target = player::find(snapshot, s.target_id.as_deref()?)?;
                (actor.is_alive && actor.holds(s.role) && target.is_alive).then_some(Action {
                    actor,
                    role: s.role,
                    target,
                })
            })
            .collect();

        Self {
            snapshot,
            roster: snapshot.to_vec(),
            actions,
            blocked: HashSet::new(),
            protected: HashMap::new(),
            events: Vec::new(),
            outcomes: BTreeMap::new(),
        }
    }

    fn by_role(&self, role: Role) -> Vec<Action<'a>> {
        self.actions.iter().copied().filter(|a| a.role == role).collect()
    }

    fn is_blocked(&self, actor: &Player) -> bool {
        self.blocked.contains(actor.id.as_str())
    }

    fn tell(&mut self, player: &Player, outcome: PrivateOutcome) {
        self.outcomes.insert(player.id.clone(), outcome);
    }

    fn suppress_lethal(&mut self) {
        let (lethal, kept): (Vec<_>, Vec<_>) =
            self.actions.iter().copied().partition(|a| a.role.is_lethal());
        self.actions = kept;
        for action in lethal {
            self.tell(
                action.actor,
                PrivateOutcome::ActionSuppressed {
                    message: "No one can be killed on the first night.".to_string(),
                },
            );
        }
    }

    /// An Escort blocked by a free Escort blocks no one. Escorts are settled
    /// until nothing changes; those left over only block each other in a
    /// cycle and cancel out.
    fn collect_blocks(&mut self) {
        let escorts = self.by_role(Role::Escort);
        let mut free: HashMap<&'a str, bool> = HashMap::new();

        loop {
            let mut changed = false;
            for escort in &escorts {
                let id = escort.actor.id.as_str();
                if free.contains_key(id) {
                    continue;
                }

                let blockers: Vec<Option<bool>> = escorts
                    .iter()
                    .filter(|b| b.target.id == escort.actor.id)
                    .map(|b| free.get(b.actor.id.as_str()).copied())
                    .collect();

                let settled = if blockers.contains(&Some(true)) {
                    Some(false)
                } else if blockers.iter().all(|b| *b == Some(false)) {
                    Some(true)
                } else {
                    None
                };
                if let Some(is_free) = settled {
                    free.insert(id, is_free);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        self.blocked = escorts
            .iter()
            .filter(|e| free.get(e.actor.id.as_str()).copied().unwrap_or(false))
            .map(|e| e.target.id.as_str())
            .collect();
        for escort in &escorts {
            if !free.contains_key(escort.actor.id.as_str()) {
                self.blocked.insert(escort.actor.id.as_str());
            }
        }
    }

    fn protect(&mut self) {
        for action in self.by_role(Role::Doctor) {
            if self.is_blocked(action.actor) {
                self.tell(action.actor, PrivateOutcome::ProtectionBlocked);
                continue;
            }

            if action.actor.id == action.target.id {
                if let Some(doctor) = player::find_mut(&mut self.roster, &action.actor.id) {
                    doctor.self_protection_used = true;
                }
            }

            self.protected
                .entry(action.target.id.as_str())
                .or_default()
                .push(action.actor.id.as_str());
            self.tell(
                action.actor,
                PrivateOutcome::ProtectionResult {
                    target_name: action.target.name.clone(),
                },
            );
        }
    }

    fn investigate(&mut self) {
        for action in self.by_role(Role::Sheriff) {
            let outcome = if self.is_blocked(action.actor) {
                PrivateOutcome::InvestigationBlocked
            } else {
                PrivateOutcome::InvestigationResult {
                    target_name: action.target.name.clone(),
                    result: action
                        .target
                        .role
                        .map(Role::appearance)
                        .unwrap_or(Appearance::Innocent),
                }
            };
            self.tell(action.actor, outcome);
        }
    }

    /// Peepers learn who visited, never what they did
    fn watch(&mut self) {
        for action in self.by_role(Role::Peeper) {
            if self.is_blocked(action.actor) {
                self.tell(action.actor, PrivateOutcome::PeepBlocked);
                continue;
            }

            let visitors = self
                .actions
                .iter()
                .filter(|other| other.target.id == action.target.id)
                .filter(|other| other.actor.id != action.actor.id)
                .filter(|other| !self.is_blocked(other.actor))
                .map(|other| other.actor.name.clone())
                .collect();

            self.tell(
                action.actor,
                PrivateOutcome::PeepResult {
                    target_name: action.target.name.clone(),
                    visitors,
                },
            );
        }
    }

    fn confirm_blocks(&mut self) {
        for action in self.by_role(Role::Escort) {
            let outcome = if self.is_blocked(action.actor) {
                PrivateOutcome::BlockBlocked
            } else {
                PrivateOutcome::BlockResult {
                    target_name: action.target.name.clone(),
                }
            };
            self.tell(action.actor, outcome);
        }
    }

    fn faction_kill(&mut self, rng: &mut (impl RandomSource + ?Sized)) {
        let snapshot = self.snapshot;
        let gunmen: Vec<&'a Player> = snapshot
            .iter()
            .filter(|p| p.is_alive && p.holds(Role::Gunman))
            .collect();
        let free_gunmen: Vec<&'a Player> = gunmen
            .iter()
            .copied()
            .filter(|g| !self.is_blocked(g))
            .collect();

        for kill in self.by_role(Role::Gunman) {
            if self.is_blocked(kill.actor) {
                self.tell(kill.actor, PrivateOutcome::KillBlocked);
            }
        }

        let mut orders = Vec::new();
        for order in self.by_role(Role::Chieftain) {
            if self.is_blocked(order.actor) {
                self.tell(order.actor, PrivateOutcome::OrderBlocked);
            } else {
                orders.push(order);
            }
        }

        if let Some(&order) = choose(rng, &orders) {
            for other in orders.iter().filter(|o| o.actor.id != order.actor.id) {
                self.tell(other.actor, PrivateOutcome::NotSelected);
            }

            let executor = if let Some(&gunman) = choose(rng, &free_gunmen) {
                for other in free_gunmen.iter().filter(|g| g.id != gunman.id) {
                    self.tell(other, PrivateOutcome::NotSelected);
                }
                gunman
            } else if gunmen.is_empty() {
                order.actor
            } else {
                self.tell(
                    order.actor,
                    PrivateOutcome::OrderFailed {
                        target_name: order.target.name.clone(),
                        reason: FailureReason::NoExecutor,
                    },
                );
                return;
            };

            self.execute(executor, order.target, Some(order.actor));
            return;
        }

        let candidates: Vec<Action<'a>> = self
            .by_role(Role::Gunman)
            .into_iter()
            .filter(|a| !self.is_blocked(a.actor))
            .collect();

        if let Some(&chosen) = choose(rng, &candidates) {
            for other in candidates.iter().filter(|a| a.actor.id != chosen.actor.id) {
                self.tell(other.actor, PrivateOutcome::NotSelected);
            }
            self.execute(chosen.actor, chosen.target, None);
        }
    }

    /// Carry out the night's single Bandit kill
    fn execute(&mut self, executor: &'a Player, target: &'a Player, leader: Option<&'a Player>) {
        let failure = if target.faction() == Some(Faction::Bandit) {
            Some(FailureReason::SameFaction)
        } else if self.protected.contains_key(target.id.as_str()) {
            Some(FailureReason::Protected)
        } else {
            None
        };

        let target_name = target.name.clone();
        match failure {
            Some(reason) => {
                self.tell(
                    executor,
                    PrivateOutcome::KillFailed {
                        target_name: target_name.clone(),
                        reason,
                    },
                );
                if let Some(leader) = leader {
                    self.tell(
                        leader,
                        PrivateOutcome::OrderFailed {
                            target_name: target_name.clone(),
                            reason,
                        },
                    );
                }
                if reason == FailureReason::Protected {
                    let doctors = self.protected.get(target.id.as_str()).cloned().unwrap_or_default();
                    for doctor in doctors {
                        self.outcomes.insert(
                            doctor.to_string(),
                            PrivateOutcome::ProtectionSuccessful {
                                target_name: target_name.clone(),
                            },
                        );
                    }
                    self.events.push(ATTACK_THWARTED.to_string());
                }
            }
            None => {
                if let Some(victim) = player::find_mut(&mut self.roster, &target.id) {
                    victim.kill(DeathCause::Bandits, executor.name.clone());
                }
                self.events
                    .push(format!("{} was killed by the Bandits.", target_name));
                self.tell(
                    executor,
                    PrivateOutcome::KillSuccess {
                        target_name: target_name.clone(),
                    },
                );
                if let Some(leader) = leader {
                    self.tell(leader, PrivateOutcome::OrderSuccess { target_name });
                }
            }
        }
    }

    /// Checked against the pre-night snapshot, so a Gunslinger shot tonight
    /// still fires and protection is never consulted
    fn gunslinger_shots(&mut self) {
        for shot in self.by_role(Role::Gunslinger) {
            if self.is_blocked(shot.actor) {
                self.tell(shot.actor, PrivateOutcome::KillBlocked);
                continue;
            }
            if shot.actor.bullets_used >= GUNSLINGER_BULLETS {
                self.tell(shot.actor, PrivateOutcome::OutOfBullets);
                continue;
            }

            if let Some(shooter) = player::find_mut(&mut self.roster, &shot.actor.id) {
                shooter.bullets_used += 1;
            }
            let already_dead = match player::find_mut(&mut self.roster, &shot.target.id) {
                Some(victim) if victim.is_alive => {
                    victim.kill(DeathCause::Gunslinger, shot.actor.name.clone());
                    false
                }
                _ => true,
            };
            // One public entry per death; a shot at a fresh corpse only reveals the shooter
            self.events.push(if already_dead {
                format!(
                    "The Gunslinger, {}, also fired at {}.",
                    shot.actor.name, shot.target.name
                )
            } else {
                format!(
                    "{} was shot by the Gunslinger, {}.",
                    shot.target.name, shot.actor.name
                )
            });
            self.tell(
                shot.actor,
                PrivateOutcome::KillSuccess {
                    target_name: shot.target.name.clone(),
                },
            );
        }
    }

    fn finish(self) -> NightResolution {
        let mut night_events = self.events;
        if night_events.is_empty() {
            night_events.push(QUIET_NIGHT.to_string());
        }
        let role_data = SubmissionTable::fresh(&self.roster);

        NightResolution {
            players: self.roster,
            night_events,
            private_events: self.outcomes,
            role_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::RoleSubmission;
    use crate::util::rng::ScriptedSource;

    fn roster(seats: &[(&str, Role)]) -> Vec<Player> {
        seats
            .iter()
            .map(|(id, role)| Player::new(*id, id.to_uppercase()).with_role(*role))
            .collect()
    }

    fn submissions(entries: &[(&str, Role, &str)]) -> SubmissionTable {
        let mut table = SubmissionTable::default();
        for (actor, role, target) in entries {
            table.record(RoleSubmission::new(*actor, *role, Some(target.to_string())));
        }
        table
    }

    fn run(players: &[Player], table: &SubmissionTable) -> NightResolution {
        resolve(players, table, NightMode::Full, &mut ScriptedSource::default())
    }

    fn alive(resolution: &NightResolution, id: &str) -> bool {
        player::find(&resolution.players, id).unwrap().is_alive
    }

    #[test]
    fn unprotected_kill_lands_with_provenance() {
        let players = roster(&[
            ("p1", Role::Doctor),
            ("p2", Role::Villager),
            ("p3", Role::Gunman),
            ("p4", Role::Villager),
        ]);
        let table = submissions(&[("p3", Role::Gunman, "p4"), ("p1", Role::Doctor, "p2")]);

        let night = run(&players, &table);

        let victim = player::find(&night.players, "p4").unwrap();
        assert!(!victim.is_alive);
        assert_eq!(victim.killed_by, Some(DeathCause::Bandits));
        assert_eq!(victim.eliminated_by.as_deref(), Some("P3"));
        assert!(alive(&night, "p1") && alive(&night, "p2") && alive(&night, "p3"));
        assert_eq!(night.night_events, vec!["P4 was killed by the Bandits.".to_string()]);
        assert_eq!(night.deaths(&players), vec!["p4".to_string()]);
    }

    #[test]
    fn doctor_saves_the_gunman_target() {
        let players = roster(&[
            ("p1", Role::Doctor),
            ("p2", Role::Villager),
            ("p3", Role::Gunman),
            ("p4", Role::Villager),
        ]);
        let table = submissions(&[("p1", Role::Doctor, "p4"), ("p3", Role::Gunman, "p4")]);

        let night = run(&players, &table);

        assert!(night.players.iter().all(|p| p.is_alive));
        assert_eq!(
            night.private_events["p3"],
            PrivateOutcome::KillFailed {
                target_name: "P4".to_string(),
                reason: FailureReason::Protected,
            }
        );
        assert_eq!(
            night.private_events["p1"],
            PrivateOutcome::ProtectionSuccessful {
                target_name: "P4".to_string()
            }
        );
        assert_eq!(night.night_events, vec![ATTACK_THWARTED.to_string()]);
    }

    #[test]
    fn blocked_gunman_kills_no_one() {
        let players = roster(&[
            ("e", Role::Escort),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("e", Role::Escort, "g"), ("g", Role::Gunman, "v")]);

        let night = run(&players, &table);

        assert!(alive(&night, "v"));
        assert_eq!(night.private_events["g"], PrivateOutcome::KillBlocked);
        assert_eq!(
            night.private_events["e"],
            PrivateOutcome::BlockResult {
                target_name: "G".to_string()
            }
        );
        assert_eq!(night.night_events, vec![QUIET_NIGHT.to_string()]);
    }

    #[test]
    fn blocked_doctor_cannot_protect() {
        let players = roster(&[
            ("d", Role::Doctor),
            ("e", Role::Escort),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[
            ("d", Role::Doctor, "v"),
            ("e", Role::Escort, "d"),
            ("g", Role::Gunman, "v"),
        ]);

        let night = run(&players, &table);

        assert!(!alive(&night, "v"));
        assert_eq!(night.private_events["d"], PrivateOutcome::ProtectionBlocked);
    }

    #[test]
    fn escorts_blocking_each_other_block_nothing() {
        let players = roster(&[
            ("e1", Role::Escort),
            ("e2", Role::Escort),
            ("s", Role::Sheriff),
            ("g", Role::Gunman),
        ]);
        let table = submissions(&[
            ("e1", Role::Escort, "e2"),
            ("e2", Role::Escort, "e1"),
            ("s", Role::Sheriff, "g"),
        ]);

        let night = run(&players, &table);

        assert_eq!(night.private_events["e1"], PrivateOutcome::BlockBlocked);
        assert_eq!(night.private_events["e2"], PrivateOutcome::BlockBlocked);
        assert_eq!(
            night.private_events["s"],
            PrivateOutcome::InvestigationResult {
                target_name: "G".to_string(),
                result: Appearance::Suspicious,
            }
        );
    }

    #[test]
    fn sheriff_sees_the_chieftain_as_innocent() {
        let players = roster(&[
            ("s", Role::Sheriff),
            ("c", Role::Chieftain),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("s", Role::Sheriff, "c")]);

        let night = run(&players, &table);

        assert_eq!(
            night.private_events["s"],
            PrivateOutcome::InvestigationResult {
                target_name: "C".to_string(),
                result: Appearance::Innocent,
            }
        );
    }

    #[test]
    fn peeper_reports_unblocked_visitors_only() {
        let players = roster(&[
            ("a", Role::Peeper),
            ("b", Role::Doctor),
            ("c", Role::Sheriff),
            ("e", Role::Escort),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[
            ("a", Role::Peeper, "v"),
            ("b", Role::Doctor, "v"),
            ("c", Role::Sheriff, "v"),
            ("e", Role::Escort, "c"),
            ("g", Role::Gunman, "v"),
        ]);

        let night = run(&players, &table);

        assert_eq!(
            night.private_events["a"],
            PrivateOutcome::PeepResult {
                target_name: "V".to_string(),
                visitors: vec!["B".to_string(), "G".to_string()],
            }
        );
        assert_eq!(night.private_events["c"], PrivateOutcome::InvestigationBlocked);
    }

    #[test]
    fn only_one_independent_gunman_kill_per_night() {
        let players = roster(&[
            ("g1", Role::Gunman),
            ("g2", Role::Gunman),
            ("v1", Role::Villager),
            ("v2", Role::Villager),
        ]);
        let table = submissions(&[("g1", Role::Gunman, "v1"), ("g2", Role::Gunman, "v2")]);

        let night = resolve(&players, &table, NightMode::Full, &mut ScriptedSource::new([1]));

        assert!(alive(&night, "v1"));
        assert!(!alive(&night, "v2"));
        assert_eq!(night.private_events["g1"], PrivateOutcome::NotSelected);
        assert_eq!(
            night.private_events["g2"],
            PrivateOutcome::KillSuccess {
                target_name: "V2".to_string()
            }
        );
        assert_eq!(night.deaths(&players).len(), 1);
    }

    #[test]
    fn chieftain_order_goes_to_a_random_free_gunman() {
        let players = roster(&[
            ("c", Role::Chieftain),
            ("g1", Role::Gunman),
            ("g2", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("c", Role::Chieftain, "v")]);

        let night = resolve(&players, &table, NightMode::Full, &mut ScriptedSource::new([0]));

        let victim = player::find(&night.players, "v").unwrap();
        assert!(!victim.is_alive);
        assert_eq!(victim.eliminated_by.as_deref(), Some("G1"));
        assert_eq!(
            night.private_events["c"],
            PrivateOutcome::OrderSuccess {
                target_name: "V".to_string()
            }
        );
        assert_eq!(
            night.private_events["g1"],
            PrivateOutcome::KillSuccess {
                target_name: "V".to_string()
            }
        );
        assert_eq!(night.private_events["g2"], PrivateOutcome::NotSelected);
    }

    #[test]
    fn lone_chieftain_carries_out_own_order() {
        let players = roster(&[("c", Role::Chieftain), ("v", Role::Villager)]);
        let table = submissions(&[("c", Role::Chieftain, "v")]);

        let night = run(&players, &table);

        assert!(!alive(&night, "v"));
        assert_eq!(
            player::find(&night.players, "v").unwrap().eliminated_by.as_deref(),
            Some("C")
        );
        assert_eq!(
            night.private_events["c"],
            PrivateOutcome::OrderSuccess {
                target_name: "V".to_string()
            }
        );
    }

    #[test]
    fn order_fails_when_every_gunman_is_blocked() {
        let players = roster(&[
            ("c", Role::Chieftain),
            ("g", Role::Gunman),
            ("e", Role::Escort),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("c", Role::Chieftain, "v"), ("e", Role::Escort, "g")]);

        let night = run(&players, &table);

        assert!(alive(&night, "v"));
        assert_eq!(
            night.private_events["c"],
            PrivateOutcome::OrderFailed {
                target_name: "V".to_string(),
                reason: FailureReason::NoExecutor,
            }
        );
    }

    #[test]
    fn gunman_cannot_kill_a_fellow_bandit() {
        let players = roster(&[
            ("g1", Role::Gunman),
            ("g2", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("g1", Role::Gunman, "g2")]);

        let night = run(&players, &table);

        assert!(night.players.iter().all(|p| p.is_alive));
        assert_eq!(
            night.private_events["g1"],
            PrivateOutcome::KillFailed {
                target_name: "G2".to_string(),
                reason: FailureReason::SameFaction,
            }
        );
        assert_eq!(night.night_events, vec![QUIET_NIGHT.to_string()]);
    }

    #[test]
    fn gunslinger_shot_ignores_protection_and_uses_the_bullet() {
        let players = roster(&[
            ("d", Role::Doctor),
            ("s", Role::Gunslinger),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("d", Role::Doctor, "g"), ("s", Role::Gunslinger, "g")]);

        let night = run(&players, &table);

        let gunman = player::find(&night.players, "g").unwrap();
        assert!(!gunman.is_alive);
        assert_eq!(gunman.killed_by, Some(DeathCause::Gunslinger));
        assert_eq!(player::find(&night.players, "s").unwrap().bullets_used, 1);
        assert_eq!(
            night.night_events,
            vec!["G was shot by the Gunslinger, S.".to_string()]
        );

        // A later night with a fresh target never fires again
        let second = submissions(&[("s", Role::Gunslinger, "v")]);
        let next = run(&night.players, &second);
        assert!(alive(&next, "v"));
        assert_eq!(next.private_events["s"], PrivateOutcome::OutOfBullets);
        assert_eq!(player::find(&next.players, "s").unwrap().bullets_used, 1);
    }

    #[test]
    fn gunslinger_and_bandits_can_kill_on_the_same_night() {
        let players = roster(&[
            ("s", Role::Gunslinger),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("g", Role::Gunman, "s"), ("s", Role::Gunslinger, "g")]);

        let night = run(&players, &table);

        assert!(!alive(&night, "s"));
        assert!(!alive(&night, "g"));
        assert_eq!(night.night_events.len(), 2);
        assert_eq!(night.deaths(&players).len(), 2);
    }

    #[test]
    fn first_night_protection_suppresses_lethal_roles() {
        let players = roster(&[
            ("d", Role::Doctor),
            ("s", Role::Gunslinger),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[
            ("d", Role::Doctor, "d"),
            ("g", Role::Gunman, "v"),
            ("s", Role::Gunslinger, "g"),
        ]);

        let night = resolve(
            &players,
            &table,
            NightMode::InformationOnly,
            &mut ScriptedSource::default(),
        );

        assert!(night.players.iter().all(|p| p.is_alive));
        assert!(matches!(
            night.private_events["g"],
            PrivateOutcome::ActionSuppressed { .. }
        ));
        assert!(matches!(
            night.private_events["s"],
            PrivateOutcome::ActionSuppressed { .. }
        ));
        assert_eq!(player::find(&night.players, "s").unwrap().bullets_used, 0);
        assert_eq!(
            night.private_events["d"],
            PrivateOutcome::ProtectionResult {
                target_name: "D".to_string()
            }
        );
        assert!(player::find(&night.players, "d").unwrap().self_protection_used);
        assert_eq!(night.night_events, vec![QUIET_NIGHT.to_string()]);
    }

    #[test]
    fn retracted_submission_has_no_effect() {
        let players = roster(&[("g", Role::Gunman), ("v", Role::Villager)]);
        let mut table = submissions(&[("g", Role::Gunman, "v")]);
        table.record(RoleSubmission::new("g", Role::Gunman, None));

        let night = run(&players, &table);

        assert!(alive(&night, "v"));
        assert!(night.private_events.is_empty());
        assert_eq!(night.night_events, vec![QUIET_NIGHT.to_string()]);
    }

    #[test]
    fn role_data_is_rebuilt_for_survivors_only() {
        let players = roster(&[
            ("d", Role::Doctor),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("g", Role::Gunman, "d")]);

        let night = run(&players, &table);

        assert!(!alive(&night, "d"));
        assert_eq!(night.role_data.len(), 1);
        let entry = night.role_data.get("g").unwrap();
        assert_eq!(entry.role, Role::Gunman);
        assert_eq!(entry.target_id, None);
    }

    #[test]
    fn escort_chain_keeps_the_last_free_block() {
        let players = roster(&[
            ("e1", Role::Escort),
            ("e2", Role::Escort),
            ("e3", Role::Escort),
            ("d", Role::Doctor),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[
            ("e1", Role::Escort, "e2"),
            ("e2", Role::Escort, "e3"),
            ("e3", Role::Escort, "d"),
            ("d", Role::Doctor, "v"),
            ("g", Role::Gunman, "v"),
        ]);

        let night = run(&players, &table);

        assert_eq!(
            night.private_events["e1"],
            PrivateOutcome::BlockResult {
                target_name: "E2".to_string()
            }
        );
        assert_eq!(night.private_events["e2"], PrivateOutcome::BlockBlocked);
        assert_eq!(
            night.private_events["e3"],
            PrivateOutcome::BlockResult {
                target_name: "D".to_string()
            }
        );
        assert_eq!(night.private_events["d"], PrivateOutcome::ProtectionBlocked);
        assert!(!alive(&night, "v"));
    }

    #[test]
    fn escort_cycle_with_a_free_outsider_still_resolves() {
        let players = roster(&[
            ("e1", Role::Escort),
            ("e2", Role::Escort),
            ("e3", Role::Escort),
            ("s", Role::Sheriff),
            ("g", Role::Gunman),
        ]);
        // e1 and e2 block each other, but the free e3 settles e1 first
        let table = submissions(&[
            ("e1", Role::Escort, "e2"),
            ("e2", Role::Escort, "e1"),
            ("e3", Role::Escort, "e1"),
            ("s", Role::Sheriff, "g"),
        ]);

        let night = run(&players, &table);

        assert_eq!(night.private_events["e1"], PrivateOutcome::BlockBlocked);
        assert_eq!(
            night.private_events["e2"],
            PrivateOutcome::BlockResult {
                target_name: "E1".to_string()
            }
        );
        assert!(matches!(
            night.private_events["s"],
            PrivateOutcome::InvestigationResult { .. }
        ));
    }

    #[test]
    fn blocked_gunslinger_keeps_the_bullet() {
        let players = roster(&[
            ("e", Role::Escort),
            ("s", Role::Gunslinger),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("e", Role::Escort, "s"), ("s", Role::Gunslinger, "v")]);

        let night = run(&players, &table);

        assert!(alive(&night, "v"));
        assert_eq!(night.private_events["s"], PrivateOutcome::KillBlocked);
        assert_eq!(player::find(&night.players, "s").unwrap().bullets_used, 0);
        assert_eq!(night.night_events, vec![QUIET_NIGHT.to_string()]);
    }

    #[test]
    fn blocked_chieftain_issues_no_order() {
        let players = roster(&[
            ("c", Role::Chieftain),
            ("g", Role::Gunman),
            ("e", Role::Escort),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("c", Role::Chieftain, "v"), ("e", Role::Escort, "c")]);

        let night = run(&players, &table);

        assert!(alive(&night, "v"));
        assert_eq!(night.private_events["c"], PrivateOutcome::OrderBlocked);
        assert!(!night.private_events.contains_key("g"));
    }

    #[test]
    fn first_night_suppresses_chieftain_orders() {
        let players = roster(&[
            ("c", Role::Chieftain),
            ("g", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("c", Role::Chieftain, "v")]);

        let night = resolve(
            &players,
            &table,
            NightMode::InformationOnly,
            &mut ScriptedSource::default(),
        );

        assert!(alive(&night, "v"));
        assert!(matches!(
            night.private_events["c"],
            PrivateOutcome::ActionSuppressed { .. }
        ));
        assert!(!night.private_events.contains_key("g"));
    }

    #[test]
    fn order_on_a_fellow_bandit_fails_for_leader_and_executor() {
        let players = roster(&[
            ("c", Role::Chieftain),
            ("g1", Role::Gunman),
            ("g2", Role::Gunman),
            ("v", Role::Villager),
        ]);
        let table = submissions(&[("c", Role::Chieftain, "g2")]);

        let night = resolve(&players, &table, NightMode::Full, &mut ScriptedSource::new([0]));

        assert!(night.players.iter().all(|p| p.is_alive));
        assert_eq!(
            night.private_events["c"],
            PrivateOutcome::OrderFailed {
                target_name: "G2".to_string(),
                reason: FailureReason::SameFaction,
            }
        );
        assert_eq!(
            night.private_events["g1"],
            PrivateOutcome::KillFailed {
                target_name: "G2".to_string(),
                reason: FailureReason::SameFaction,
            }
        );
    }

    #[test]
    fn gunslinger_shot_at_a_bandit_victim_only_reveals_the_shooter() {
        let players = roster(&[
            ("s", Role::Gunslinger),
            ("g", Role::Gunman),
            ("v", Role::Villager),
            ("w", Role::Villager),
        ]);
        let table = submissions(&[("g", Role::Gunman, "v"), ("s", Role::Gunslinger, "v")]);

        let night = run(&players, &table);

        let victim = player::find(&night.players, "v").unwrap();
        assert_eq!(victim.killed_by, Some(DeathCause::Bandits));
        assert_eq!(night.deaths(&players), vec!["v".to_string()]);
        assert_eq!(
            night.night_events,
            vec![
                "V was killed by the Bandits.".to_string(),
                "The Gunslinger, S, also fired at V.".to_string(),
            ]
        );
        assert_eq!(player::find(&night.players, "s").unwrap().bullets_used, 1);
    }
}
