//! Field events (observer list → Bevy events, доставка один раз на событие)

use bevy::prelude::*;

use super::visualization::VisualizationParams;

/// Event: включить/выключить поле (внешняя команда)
#[derive(Event, Debug, Clone, Copy)]
pub struct SetFieldActive {
    pub field: Entity,
    pub active: bool,
}

/// Event: персонаж вошёл в поле (locomotion overridden)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterEnteredField {
    pub field: Entity,
    pub character: Entity,
}

/// Event: персонаж отпущен полем (вышел, исчез, или поле выключено)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterLeftField {
    pub field: Entity,
    pub character: Entity,
}

/// Event: параметры визуализации (раз в тик, косметика)
#[derive(Event, Debug, Clone, Copy)]
pub struct FieldVisualsUpdated {
    pub field: Entity,
    pub params: VisualizationParams,
}

/// Event: поле выключено, визуализацию снять
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldVisualsCleared {
    pub field: Entity,
}

/// Event: поле уничтожено (все персонажи уже восстановлены)
///
/// `owner`: projectile, который заспавнил поле (если есть).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDestroyed {
    pub field: Entity,
    pub owner: Option<Entity>,
}
