//! # EventType
//! Events are split into "user events" and "meta events". User events are
//! the application's own (completions, in our case). Meta events are
//! reserved for the engine itself — device naming and similar bookkeeping
//! that should not leak into application folds. There are none yet, but the
//! wire format accounts for them so adding one is not a breaking change.

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub enum MetaEvent {}

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(from_wasm_abi, into_wasm_abi))]
pub enum EventType<E> {
    User(E),
    Meta(MetaEvent),
}

impl<E> EventType<E> {
    pub fn map<G, F: Fn(E) -> G>(self, f: F) -> EventType<G> {
        match self {
            EventType::User(e) => EventType::User(f(e)),
            EventType::Meta(e) => EventType::Meta(e),
        }
    }

    pub fn user(&self) -> Option<&E> {
        match self {
            EventType::User(e) => Some(e),
            EventType::Meta(_) => None,
        }
    }
}

impl<E, Error> EventType<Result<E, Error>> {
    pub fn transpose(self) -> Result<EventType<E>, Error> {
        match self {
            EventType::User(e) => e.map(EventType::User),
            EventType::Meta(e) => Ok(EventType::Meta(e)),
        }
    }
}

impl<E: crate::Event> crate::Event for EventType<E> {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let s = self.clone().map(|e| e.to_json()).transpose()?;
        serde_json::to_value(&s)
    }

    fn from_json(json: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let s = serde_json::from_value::<EventType<serde_json::Value>>(json.clone())?;
        s.map(|e| E::from_json(&e)).transpose()
    }
}
