//! Creature death

use tracing::{info, warn};

use crate::consts::RELEASED_CREATURE_DELAY;
use crate::creature::relations::{check_for_continued_leadership, demote_from_leadership};
use crate::creature::{AbilityFlags, BookkeepingFlags, CreatureId};
use crate::events::SimEvent;
use crate::messages::{MessageColor, MessageFlags, monster_name};
use crate::sim::{Sim, stale_handle};
use crate::telemetry::TelemetryEvent;

/// Kill a creature.
///
/// An administrative death (a clone with nowhere to stand, an image that
/// expired) removes the creature without any of the consequences of dying:
/// its carried item vanishes, nothing is spawned and nobody mourns it.
/// Otherwise the item is dropped where it died, the death feature is
/// spawned, and a creature it carried is set free. Calling this on a
/// creature that is already dying does nothing.
pub fn kill_creature(sim: &mut Sim, id: CreatureId, administrative: bool) {
    let is_player = sim.is_player(id);
    let Some(c) = sim.roster.get_mut(id) else {
        return stale_handle(id);
    };
    if c.is_dying() {
        return;
    }
    if !is_player {
        c.bookkeeping |= BookkeepingFlags::IS_DYING;
    }
    let pos = c.pos;
    let carried_item = c.carried_item.take();
    let death_feature = c
        .info
        .death_feature
        .filter(|_| c.has_ability(AbilityFlags::DF_ON_DEATH) && !c.has_bookkeeping(BookkeepingFlags::IS_FALLING));
    let mourned = c.is_ally()
        && !c.is_inanimate()
        && !c.has_bookkeeping(BookkeepingFlags::BOUND_TO_LEADER)
        && c.carried_monster.is_none();
    let dormant = c.has_bookkeeping(BookkeepingFlags::IS_DORMANT);
    let leader = c.leader;
    let name = c.info.name.clone();

    if let Some(item) = carried_item
        && !administrative
    {
        sim.drop_item_at(item, pos);
    }
    if !administrative && let Some(feature) = death_feature {
        sim.spawn_feature(pos, feature, None);
    }

    if !is_player {
        if !administrative && mourned && !sim.can_see_monster(id) {
            sim.messages
                .message_colored("you feel a sense of loss.", MessageColor::Bad, MessageFlags::empty());
        }
        let carried = sim.roster.get_mut(id).and_then(|c| {
            c.bookkeeping |= BookkeepingFlags::HAS_DIED;
            if administrative {
                c.bookkeeping |= BookkeepingFlags::ADMINISTRATIVE_DEATH;
            }
            c.carried_monster.take()
        });
        if let Some(mut inner) = carried
            && !administrative
            && !dormant
        {
            inner.pos = pos;
            inner.ticks_until_turn = RELEASED_CREATURE_DELAY;
            let released = inner.id;
            match sim.roster.add(*inner) {
                Ok(_) => {
                    if sim.can_see_monster(released) {
                        let name = monster_name(sim, released, true);
                        sim.message(&format!("{} appears", name), MessageFlags::empty());
                    }
                }
                Err(e) => warn!(%e, "carried creature could not be released"),
            }
        }
    }

    if let Some(c) = sim.roster.get_mut(id) {
        c.current_hp = 0;
    }
    demote_from_leadership(sim, id);
    if let Some(leader) = leader {
        check_for_continued_leadership(sim, leader);
    }

    sim.emit(SimEvent::Death {
        creature: id,
        administrative,
    });
    if !is_player && !administrative {
        let killed_by = last_attacker_name(sim, id);
        info!(%id, monster = %name, %killed_by, "monster killed");
        sim.telemetry(TelemetryEvent::MonsterKilled {
            monster_name: name,
            killed_by,
        });
    }
}

/// Who dealt the most recent damage to `victim`: "you", a monster name, or
/// "magic" when nobody did.
fn last_attacker_name(sim: &Sim, victim: CreatureId) -> String {
    match sim.roster.get(victim).and_then(|c| c.last_attacker) {
        Some(a) if sim.is_player(a) => "you".to_string(),
        Some(a) => sim
            .roster
            .get(a)
            .map(|c| c.info.name.clone())
            .unwrap_or_else(|| "something".to_string()),
        None => "magic".to_string(),
    }
}
