use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PowerUpKind {
    /// One more bomb can be live at once
    #[serde(rename = "b")]
    Bombs,
    /// Bigger blast radius
    #[serde(rename = "f")]
    Flames,
    #[serde(rename = "s")]
    Speed,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PowerUp {
    pos: (i32, i32),
    kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(pos: (i32, i32), kind: PowerUpKind) -> Self {
        PowerUp { pos, kind }
    }

    pub fn kind(&self) -> PowerUpKind {
        self.kind
    }
}

impl crate::Positioned for PowerUp {
    fn position(&self) -> (i32, i32) {
        self.pos
    }
}
