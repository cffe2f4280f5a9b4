//! Таблица override'ов персонажей внутри поля
//!
//! Инвариант: не больше одной записи на персонажа. Состояние "до входа"
//! снимается один раз (первый sample), последующие тики его не трогают.
//! `Entity` здесь = weak reference: generational handle, живость
//! проверяется через `CharacterLocomotion::is_alive` перед каждым использованием.

use bevy::prelude::*;

use crate::locomotion::MovementMode;

/// Locomotion state, сохранённый при входе в поле
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedLocomotion {
    pub gravity_scale: f32,
    pub movement_mode: MovementMode,
}

/// Запись о персонаже, которого поле сейчас держит
///
/// `saved == None`: персонаж отслеживается, но его locomotion не читался
/// на входе (movement компонент отсутствовал).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffectedCharacterState {
    pub character: Entity,
    pub saved: Option<SavedLocomotion>,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterGravityOverrideTable {
    // Vec вместо HashMap: порядок детерминирован, персонажей в поле единицы
    entries: Vec<AffectedCharacterState>,
}

impl CharacterGravityOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, character: Entity) -> bool {
        self.entries.iter().any(|entry| entry.character == character)
    }

    pub fn get(&self, character: Entity) -> Option<&AffectedCharacterState> {
        self.entries.iter().find(|entry| entry.character == character)
    }

    /// Добавляет запись, если персонажа ещё нет
    ///
    /// Возвращает `false` (и ничего не меняет), если запись уже есть.
    pub fn capture(&mut self, character: Entity, saved: Option<SavedLocomotion>) -> bool {
        if self.contains(character) {
            return false;
        }
        self.entries.push(AffectedCharacterState { character, saved });
        true
    }

    pub fn remove(&mut self, character: Entity) -> Option<AffectedCharacterState> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.character == character)?;
        Some(self.entries.remove(index))
    }

    /// Все отслеживаемые персонажи (в порядке входа)
    pub fn characters(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().map(|entry| entry.character)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffectedCharacterState> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking() -> Option<SavedLocomotion> {
        Some(SavedLocomotion {
            gravity_scale: 1.0,
            movement_mode: MovementMode::Walking,
        })
    }

    #[test]
    fn test_capture_keeps_first_sample() {
        let mut table = CharacterGravityOverrideTable::new();
        let character = Entity::from_raw(7);

        assert!(table.capture(character, walking()));
        assert!(!table.capture(
            character,
            Some(SavedLocomotion {
                gravity_scale: 0.0,
                movement_mode: MovementMode::Flying,
            })
        ));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(character).unwrap().saved, walking());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = CharacterGravityOverrideTable::new();
        let character = Entity::from_raw(3);
        table.capture(character, walking());

        assert!(table.remove(character).is_some());
        assert!(table.remove(character).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_characters_in_entry_order() {
        let mut table = CharacterGravityOverrideTable::new();
        let a = Entity::from_raw(10);
        let b = Entity::from_raw(2);
        table.capture(a, walking());
        table.capture(b, None);

        let order: Vec<_> = table.characters().collect();
        assert_eq!(order, vec![a, b]);

        table.clear();
        assert_eq!(table.characters().count(), 0);
    }
}
