//! Scored combat action candidates and their execution.

use glam::Vec2;
use rampart_combat::{Hit, Strike};
use rampart_core::{
    find_mut, AbilityKind, AbilitySpec, Attacker, AttackerId, BehaviorTuning, Cohort, EntityRef,
    HazardId, Intent, StatusEffect, StatusKind,
};
use rand::Rng;
use tracing::warn;

use crate::{Snapshot, Surroundings};

const ATTACK_SCORE: f32 = 1.0;
const INTENT_MATCH_BONUS: f32 = 0.5;
const BLAST_HIT_SCORE: f32 = 0.6;
const CRITICAL_BONUS: f32 = 0.5;
const SUPPORT_INTENT_BONUS: f32 = 0.3;
const SHIELD_BASE: f32 = 0.2;
const SHIELD_VULNERABILITY: f32 = 0.5;
const DISARM_BASE: f32 = 0.3;
const DISARM_DANGER_SCALE: f32 = 0.1;
const AURA_BASE: f32 = 0.3;
const AURA_PER_ALLY: f32 = 0.15;
const SELF_SHIELD_BASE: f32 = 0.4;
const SELF_SHIELD_RATIO: f32 = 0.75;
const TAUNT_BASE: f32 = 0.35;
const TAUNT_REACH: f32 = 3.0;
const RANGE_SLACK: f32 = 0.5;

/// Best area-attack placement found by [`plan_blast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlastPlan {
    /// Blast center.
    pub center: Vec2,
    /// Number of targets inside the blast.
    pub hits: usize,
}

/// Chooses the blast center maximising simultaneous hits.
///
/// Candidate centers are every target position plus the centroid of each
/// target's neighbourhood; centers farther than `range` from `origin` are
/// skipped. Equal hit counts prefer the center nearest to `origin`.
#[must_use]
pub fn plan_blast(origin: Vec2, range: f32, radius: f32, targets: &[Vec2]) -> Option<BlastPlan> {
    if !range.is_finite() || !radius.is_finite() || range < 0.0 || radius < 0.0 {
        return None;
    }

    let evaluate = |center: Vec2| -> Option<(BlastPlan, f32)> {
        let distance = center.distance(origin);
        if distance > range {
            return None;
        }
        let hits = targets
            .iter()
            .filter(|target| target.distance(center) <= radius)
            .count();
        (hits > 0).then_some((BlastPlan { center, hits }, distance))
    };

    let mut best: Option<(BlastPlan, f32)> = None;
    for target in targets {
        let (sum, count) = targets
            .iter()
            .filter(|other| other.distance(*target) <= radius * 2.0)
            .fold((Vec2::ZERO, 0_usize), |(sum, count), other| {
                (sum + *other, count + 1)
            });
        let centroid = (count > 1).then(|| sum / count as f32);

        for center in std::iter::once(*target).chain(centroid) {
            let Some(candidate) = evaluate(center) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((plan, distance)) => {
                    candidate.0.hits > plan.hits
                        || (candidate.0.hits == plan.hits && candidate.1 < *distance)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best.map(|(plan, _)| plan)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    Attack(EntityRef),
    Blast(Vec2),
    Heal,
    Shield,
    Disarm(HazardId),
    Aura,
    SelfShield,
    Taunt,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    action: Action,
    spec: Option<(usize, AbilitySpec)>,
    picks: (usize, usize),
    score: f32,
    order: usize,
}

/// Scratch buffers for one attacker's action phase.
#[derive(Debug, Default)]
pub(crate) struct ActionPlanner {
    candidates: Vec<Candidate>,
    picks: Vec<Option<AttackerId>>,
    pool: Vec<(Option<AttackerId>, f32)>,
    positions: Vec<Vec2>,
}

impl ActionPlanner {
    /// Builds, biases and sorts the candidate list for `attacker`.
    pub(crate) fn plan<R>(
        &mut self,
        attacker: &Attacker,
        snapshot: &Snapshot,
        tuning: &BehaviorTuning,
        rng: &mut R,
    ) where
        R: Rng + ?Sized,
    {
        self.candidates.clear();
        self.picks.clear();

        if let Some(attack) = attacker.stats.attack {
            if attacker.attack_timer <= 0.0 {
                self.plan_attack(attacker, snapshot, attack.range);
            }
        }

        for (slot, data) in attacker.stats.abilities.iter().enumerate() {
            if attacker.ability_timers.get(slot).copied().unwrap_or(0.0) > 0.0 {
                continue;
            }
            let spec = match data.resolve() {
                Ok(spec) => spec,
                Err(error) => {
                    warn!(attacker = attacker.id.get(), %error, "skipping malformed ability");
                    continue;
                }
            };
            self.plan_ability(attacker, snapshot, tuning, slot, spec);
        }

        let jitter = tuning.action_jitter.max(0.0);
        for candidate in &mut self.candidates {
            let kind = candidate.spec.map(|(_, spec)| spec.kind);
            candidate.score += attacker.action_bias.get(kind) + rng.gen_range(-jitter..=jitter);
        }
        self.candidates
            .sort_by(|a, b| b.score.total_cmp(&a.score).then(a.order.cmp(&b.order)));
    }

    fn plan_attack(&mut self, attacker: &Attacker, snapshot: &Snapshot, range: f32) {
        let defender = snapshot
            .priority_defender(range)
            .map(|sighting| EntityRef::Defender(sighting.id));
        let hazard = snapshot
            .nearest_hazard()
            .filter(|sighting| sighting.distance <= range)
            .map(|sighting| EntityRef::Hazard(sighting.id));
        let target = if attacker.intent == Intent::PressureTraps {
            hazard.or(defender)
        } else {
            defender.or(hazard)
        };
        let Some(target) = target else {
            return;
        };

        let mut score = ATTACK_SCORE;
        if matches!(
            (attacker.intent, target),
            (Intent::Hunt, EntityRef::Defender(_)) | (Intent::PressureTraps, EntityRef::Hazard(_))
        ) {
            score += INTENT_MATCH_BONUS;
        }
        self.push(Action::Attack(target), None, score);
    }

    fn plan_ability(
        &mut self,
        attacker: &Attacker,
        snapshot: &Snapshot,
        tuning: &BehaviorTuning,
        slot: usize,
        spec: AbilitySpec,
    ) {
        let intent = attacker.intent;
        let support_bonus = if intent == Intent::Support {
            SUPPORT_INTENT_BONUS
        } else {
            0.0
        };
        let ability = Some((slot, spec));

        match spec.kind {
            AbilityKind::Blast => {
                self.positions.clear();
                self.positions.extend(
                    snapshot
                        .defenders
                        .iter()
                        .filter(|sighting| sighting.distance <= spec.range + spec.radius)
                        .map(|sighting| sighting.position),
                );
                let origin = attacker.agent.position;
                if let Some(plan) = plan_blast(origin, spec.range, spec.radius, &self.positions) {
                    let mut score = plan.hits as f32 * BLAST_HIT_SCORE;
                    if intent == Intent::Hunt {
                        score += INTENT_MATCH_BONUS;
                    }
                    self.push(Action::Blast(plan.center), ability, score);
                }
            }
            AbilityKind::HealAllies => {
                self.pool.clear();
                self.pool.extend(
                    snapshot
                        .allies_below(tuning.injured_ally_ratio)
                        .filter(|ally| ally.distance <= spec.range)
                        .map(|ally| (Some(ally.id), ally.hp_ratio)),
                );
                let own = attacker.agent.hp_ratio();
                if own < tuning.injured_ally_ratio {
                    self.pool.push((None, own));
                }
                let critical = tuning.critical_ally_ratio;
                let start = self.picks.len();
                if let Some(score) = self.take_picks(spec.max_targets, |ratio| {
                    (1.0 - ratio) + if ratio < critical { CRITICAL_BONUS } else { 0.0 }
                }) {
                    self.push_with_picks(Action::Heal, ability, score + support_bonus, start);
                }
            }
            AbilityKind::ShieldAllies => {
                self.pool.clear();
                self.pool.extend(
                    snapshot
                        .allies
                        .iter()
                        .filter(|ally| !ally.shielded && ally.distance <= spec.range)
                        .map(|ally| (Some(ally.id), ally.hp_ratio)),
                );
                if !is_shielded(attacker) {
                    self.pool.push((None, attacker.agent.hp_ratio()));
                }
                let start = self.picks.len();
                if let Some(score) = self.take_picks(spec.max_targets, |ratio| {
                    SHIELD_BASE + (1.0 - ratio) * SHIELD_VULNERABILITY
                }) {
                    self.push_with_picks(Action::Shield, ability, score + support_bonus, start);
                }
            }
            AbilityKind::Disarm => {
                if let Some(hazard) = snapshot
                    .nearest_hazard()
                    .filter(|sighting| sighting.distance <= spec.range)
                {
                    let mut score = DISARM_BASE + hazard.danger * DISARM_DANGER_SCALE;
                    if intent == Intent::PressureTraps {
                        score += INTENT_MATCH_BONUS;
                    }
                    self.push(Action::Disarm(hazard.id), ability, score);
                }
            }
            AbilityKind::Aura => {
                let covered = snapshot
                    .allies
                    .iter()
                    .filter(|ally| ally.distance <= spec.radius)
                    .count();
                if covered > 0 {
                    let score = AURA_BASE + AURA_PER_ALLY * covered as f32;
                    self.push(Action::Aura, ability, score);
                }
            }
            AbilityKind::SelfShield => {
                let ratio = attacker.agent.hp_ratio();
                if !is_shielded(attacker)
                    && (ratio < SELF_SHIELD_RATIO || !snapshot.defenders.is_empty())
                {
                    self.push(Action::SelfShield, ability, SELF_SHIELD_BASE + (1.0 - ratio));
                }
            }
            AbilityKind::Taunt => {
                if !attacker.agent.has_effect(StatusKind::Taunt)
                    && snapshot.priority_defender(TAUNT_REACH).is_some()
                {
                    let mut score = TAUNT_BASE;
                    if intent == Intent::Hunt {
                        score += INTENT_MATCH_BONUS;
                    }
                    self.push(Action::Taunt, ability, score);
                }
            }
            AbilityKind::RepairHazard => {}
        }
    }

    /// Moves the neediest `limit` entries of the pool into `picks`.
    fn take_picks<F>(&mut self, limit: u32, value: F) -> Option<f32>
    where
        F: Fn(f32) -> f32,
    {
        if self.pool.is_empty() || limit == 0 {
            return None;
        }
        self.pool
            .sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let taken = self.pool.len().min(limit as usize);
        let mut score = 0.0;
        for &(target, ratio) in &self.pool[..taken] {
            self.picks.push(target);
            score += value(ratio);
        }
        Some(score)
    }

    fn push(&mut self, action: Action, spec: Option<(usize, AbilitySpec)>, score: f32) {
        let start = self.picks.len();
        self.push_with_picks(action, spec, score, start);
    }

    fn push_with_picks(
        &mut self,
        action: Action,
        spec: Option<(usize, AbilitySpec)>,
        score: f32,
        start: usize,
    ) {
        let order = self.candidates.len();
        self.candidates.push(Candidate {
            action,
            spec,
            picks: (start, self.picks.len()),
            score,
            order,
        });
    }

    /// Executes every non-negative candidate in score order.
    ///
    /// Each candidate has its own cooldown, so several can fire in one tick.
    /// Returns the number of actions taken.
    pub(crate) fn execute<R>(
        &self,
        attacker: &mut Attacker,
        allies: &mut Cohort<'_, Attacker>,
        field: &mut Surroundings<'_>,
        rng: &mut R,
        strikes: &mut Vec<Strike>,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut taken = 0;
        for candidate in &self.candidates {
            if candidate.score < 0.0 || !attacker.agent.is_alive() {
                break;
            }
            let ready = match candidate.spec {
                Some((slot, _)) => attacker.ability_timers.get(slot).map_or(true, |t| *t <= 0.0),
                None => attacker.attack_timer <= 0.0,
            };
            if !ready {
                continue;
            }

            let picks = self
                .picks
                .get(candidate.picks.0..candidate.picks.1)
                .unwrap_or(&[]);
            perform(candidate, picks, attacker, allies, field, rng, strikes);

            match candidate.spec {
                Some((slot, spec)) => {
                    if let Some(timer) = attacker.ability_timers.get_mut(slot) {
                        *timer = spec.cooldown;
                    }
                }
                None => {
                    attacker.attack_timer = attacker.stats.attack.map_or(0.0, |a| a.cooldown);
                }
            }
            taken += 1;
        }
        taken
    }
}

fn perform<R>(
    candidate: &Candidate,
    picks: &[Option<AttackerId>],
    attacker: &mut Attacker,
    allies: &mut Cohort<'_, Attacker>,
    field: &mut Surroundings<'_>,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) where
    R: Rng + ?Sized,
{
    let me = EntityRef::Attacker(attacker.id);
    let spec = candidate.spec.map(|(_, spec)| spec);

    match (candidate.action, spec) {
        (Action::Attack(target), _) => {
            let Some(attack) = attacker.stats.attack else {
                return;
            };
            let hit = Hit::from_agent(attack.damage, attack.damage_type, me, &attacker.agent);
            let reach = attack.range + RANGE_SLACK;
            match target {
                EntityRef::Defender(id) => {
                    let Some(defender) = find_mut(field.defenders, id) else {
                        return;
                    };
                    if defender.agent.position.distance(attacker.agent.position) > reach {
                        return;
                    }
                    let strike = field.resolver.strike(&hit, target, &mut defender.agent, rng);
                    strikes.push(strike);
                    if let Some(effect) = attack.effect {
                        let effect = effect.instantiate(Some(me));
                        let _ = field.effects.add(&mut defender.agent, effect);
                    }
                }
                EntityRef::Hazard(id) => {
                    let Some(hazard) = find_mut(field.hazards, id) else {
                        return;
                    };
                    if hazard.position().distance(attacker.agent.position) > reach {
                        return;
                    }
                    strikes.push(field.resolver.strike(&hit, target, hazard, rng));
                }
                EntityRef::Attacker(_) => {}
            }
        }
        (Action::Blast(center), Some(spec)) => {
            let hit = Hit::from_agent(spec.power, spec.damage_type, me, &attacker.agent);
            for defender in field.defenders.iter_mut() {
                let agent = &defender.agent;
                if !agent.is_alive() || agent.position.distance(center) > spec.radius {
                    continue;
                }
                let target = EntityRef::Defender(defender.id);
                strikes.push(field.resolver.strike(&hit, target, &mut defender.agent, rng));
                if let Some(effect) = spec.effect {
                    let _ = field.effects.add(&mut defender.agent, effect.instantiate(Some(me)));
                }
            }
        }
        (Action::Heal, Some(spec)) => {
            for pick in picks {
                let agent = match pick {
                    None => &mut attacker.agent,
                    Some(id) => match allies.get_mut(*id) {
                        Some(ally) => &mut ally.agent,
                        None => continue,
                    },
                };
                let _ = agent.heal(spec.power);
            }
        }
        (Action::Shield, Some(spec)) => {
            for pick in picks {
                let agent = match pick {
                    None => &mut attacker.agent,
                    Some(id) => match allies.get_mut(*id) {
                        Some(ally) => &mut ally.agent,
                        None => continue,
                    },
                };
                let shield = StatusEffect::new(StatusKind::Shield, spec.duration, spec.power)
                    .with_source(Some(me));
                let _ = field.effects.add(agent, shield);
            }
        }
        (Action::Disarm(id), Some(spec)) => {
            let Some(hazard) = find_mut(field.hazards, id) else {
                return;
            };
            if hazard.position().distance(attacker.agent.position) > spec.range + RANGE_SLACK {
                return;
            }
            let hit = Hit::from_agent(spec.power, spec.damage_type, me, &attacker.agent);
            strikes.push(field.resolver.strike(&hit, EntityRef::Hazard(id), hazard, rng));
        }
        (Action::Aura, Some(spec)) => {
            let Some(template) = spec.effect else {
                return;
            };
            let origin = attacker.agent.position;
            for ally in allies.iter_mut() {
                if ally.agent.is_alive() && ally.agent.position.distance(origin) <= spec.radius {
                    let _ = field.effects.add(&mut ally.agent, template.instantiate(Some(me)));
                }
            }
            let _ = field.effects.add(&mut attacker.agent, template.instantiate(Some(me)));
        }
        (Action::SelfShield, Some(spec)) => {
            let shield = StatusEffect::new(StatusKind::Shield, spec.duration, spec.power)
                .with_source(Some(me));
            let _ = field.effects.add(&mut attacker.agent, shield);
        }
        (Action::Taunt, Some(spec)) => {
            let taunt =
                StatusEffect::new(StatusKind::Taunt, spec.duration, 0.0).with_source(Some(me));
            let _ = field.effects.add(&mut attacker.agent, taunt);
        }
        (_, None) => {}
    }
}

fn is_shielded(attacker: &Attacker) -> bool {
    attacker.agent.barrier() > 0.0 || attacker.agent.has_effect(StatusKind::Shield)
}
