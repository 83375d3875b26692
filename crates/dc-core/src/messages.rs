//! Message log, combat text batching, creature naming and pronouns

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::creature::{CreatureId, Gender, StatusKind};
use crate::sim::Sim;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u8 {
        /// The presentation layer should wait for a keypress
        const REQUIRE_ACK = 1 << 0;
        /// May be folded into the previous line of the same turn
        const FOLDABLE = 1 << 1;
    }
}

impl_bits_serde!(MessageFlags, u8);

/// How a message should be tinted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageColor {
    #[default]
    Plain,
    /// Something good happened to the player's side
    Good,
    /// Something bad happened to the player's side
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub flags: MessageFlags,
    pub color: MessageColor,
    pub turn: u64,
    /// Repeats of this text collapsed into one entry
    pub count: u32,
}

/// Archive of displayed messages plus the pending combat text buffer.
///
/// Combat lines are held back until [`display_combat_text`] so that the
/// player's own blows read before the monsters' replies.
///
/// [`display_combat_text`]: MessageLog::display_combat_text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    archive: Vec<Message>,
    combat_text: Vec<(String, MessageColor)>,
    turn: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive a message, flushing pending combat text first.
    pub fn message(&mut self, text: &str, flags: MessageFlags) {
        self.message_colored(text, MessageColor::Plain, flags);
    }

    pub fn message_colored(&mut self, text: &str, color: MessageColor, flags: MessageFlags) {
        if text.is_empty() {
            return;
        }
        self.display_combat_text();
        self.archive_line(text, color, flags);
    }

    fn archive_line(&mut self, text: &str, color: MessageColor, flags: MessageFlags) {
        let text = capitalize(text);
        if let Some(last) = self.archive.last_mut()
            && last.text == text
            && last.turn == self.turn
        {
            last.count += 1;
            return;
        }
        tracing::trace!(%text, "message");
        self.archive.push(Message {
            text,
            flags,
            color,
            turn: self.turn,
            count: 1,
        });
    }

    /// Queue a line of combat text.
    pub fn combat_message(&mut self, text: &str, color: MessageColor) {
        if !text.is_empty() {
            self.combat_text.push((text.to_string(), color));
        }
    }

    /// Flush queued combat text, one foldable message per line.
    pub fn display_combat_text(&mut self) {
        let pending = std::mem::take(&mut self.combat_text);
        for (text, color) in pending {
            self.archive_line(&text, color, MessageFlags::FOLDABLE);
        }
    }

    pub fn has_pending_combat_text(&self) -> bool {
        !self.combat_text.is_empty()
    }

    /// Start a new player turn; duplicates only fold within a turn.
    pub fn next_turn(&mut self) {
        self.turn += 1;
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn archive(&self) -> &[Message] {
        &self.archive
    }

    pub fn last(&self) -> Option<&Message> {
        self.archive.last()
    }

    /// Archived texts in order, for assertions and transcripts
    pub fn texts(&self) -> Vec<&str> {
        self.archive.iter().map(|m| m.text.as_str()).collect()
    }

    /// Whether any archived message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.archive.iter().any(|m| m.text.contains(needle))
    }

    pub fn clear(&mut self) {
        self.archive.clear();
        self.combat_text.clear();
    }
}

/// Upper-case the first character
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display name of a creature as the player perceives it.
///
/// The player is "you" and unseen creatures are "something". While the
/// player hallucinates without telepathy, a random catalog name is drawn
/// from the cosmetic stream so replays are unaffected.
pub fn monster_name(sim: &mut Sim, id: CreatureId, include_article: bool) -> String {
    if sim.is_player(id) {
        return "you".to_string();
    }
    if !sim.can_see_monster(id) {
        return "something".to_string();
    }
    let hallucinating = sim.player_status(StatusKind::Hallucinating) > 0
        && sim.player_status(StatusKind::Telepathic) == 0;
    if hallucinating && sim.catalog.len() > 1 {
        let index = {
            let mut rng = sim.rng.cosmetic();
            rng.uniform_range(1, sim.catalog.len() as i32 - 1) as usize
        };
        let name = sim.catalog[index].name.clone();
        return if include_article { format!("the {}", name) } else { name };
    }
    let Some(c) = sim.roster.get(id) else {
        return "something".to_string();
    };
    if !include_article {
        c.info.name.clone()
    } else if c.is_ally() {
        format!("your {}", c.info.name)
    } else {
        format!("the {}", c.info.name)
    }
}

/// Message tint for something happening to `victim`
pub fn color_for_victim(sim: &Sim, victim: CreatureId) -> MessageColor {
    let friendly = sim.is_player(victim) || sim.roster.get(victim).is_some_and(|c| c.is_ally());
    if friendly {
        MessageColor::Bad
    } else {
        MessageColor::Good
    }
}

const PRONOUNS: [(&str, [&str; 4]); 4] = [
    ("$HIMSELFHERSELF", ["yourself", "himself", "herself", "itself"]),
    ("$HESHE", ["you", "he", "she", "it"]),
    ("$HIMHER", ["you", "him", "her", "it"]),
    ("$HISHER", ["your", "his", "her", "its"]),
];

/// Replace `$HESHE`, `$HIMHER`, `$HISHER` and `$HIMSELFHERSELF` with the
/// pronouns for `id`. A pronoun directly after a period is capitalized.
pub fn resolve_pronouns(sim: &Sim, text: &str, id: CreatureId) -> String {
    let form = if sim.is_player(id) {
        0
    } else if !sim.can_see_monster(id) {
        3
    } else {
        match sim.roster.get(id).map(|c| c.gender()) {
            Some(Gender::Male) => 1,
            Some(Gender::Female) => 2,
            _ => 3,
        }
    };

    let mut out = String::with_capacity(text.len());
    let mut capitalize_next = false;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '$'
            && let Some((escape, forms)) = PRONOUNS.iter().find(|(e, _)| rest.starts_with(e))
        {
            if capitalize_next {
                out.push_str(&capitalize(forms[form]));
                capitalize_next = false;
            } else {
                out.push_str(forms[form]);
            }
            rest = &rest[escape.len()..];
            continue;
        }
        if ch == '.' {
            capitalize_next = true;
        } else if ch != ' ' {
            capitalize_next = false;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combat_text_flushes_before_message() {
        let mut log = MessageLog::new();
        log.combat_message("you hit the goblin", MessageColor::Good);
        log.combat_message("the goblin misses you", MessageColor::Plain);
        assert!(log.archive().is_empty());
        log.message("you feel hungry", MessageFlags::empty());
        assert_eq!(
            log.texts(),
            vec!["You hit the goblin", "The goblin misses you", "You feel hungry"]
        );
        assert!(log.archive()[0].flags.contains(MessageFlags::FOLDABLE));
        assert!(!log.archive()[2].flags.contains(MessageFlags::FOLDABLE));
    }

    #[test]
    fn test_duplicates_fold_within_turn() {
        let mut log = MessageLog::new();
        log.message("you hear combat in the distance", MessageFlags::empty());
        log.message("you hear combat in the distance", MessageFlags::empty());
        assert_eq!(log.archive().len(), 1);
        assert_eq!(log.archive()[0].count, 2);
        log.next_turn();
        log.message("you hear combat in the distance", MessageFlags::empty());
        assert_eq!(log.archive().len(), 2);
    }

    #[test]
    fn test_empty_message_is_ignored() {
        let mut log = MessageLog::new();
        log.message("", MessageFlags::REQUIRE_ACK);
        log.combat_message("", MessageColor::Plain);
        log.display_combat_text();
        assert!(log.archive().is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("the goblin"), "The goblin");
        assert_eq!(capitalize(""), "");
    }
}
