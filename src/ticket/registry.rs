use std::collections::BTreeMap;

use serde::Serialize;

use super::builder::FlowParamBuilder;
use super::detail::DetailKind;
use super::{ClusterPhase, IamAction, Ticket, TicketError, TicketType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub ticket_type: TicketType,
    pub phase: ClusterPhase,
    pub iam: IamAction,
    pub name: &'static str,
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        ticket_type: TicketType::RedisProxyClose,
        phase: ClusterPhase::Offline,
        iam: IamAction::RedisOpenClose,
        name: "Disable cluster",
    },
    Registration {
        ticket_type: TicketType::RedisProxyOpen,
        phase: ClusterPhase::Online,
        iam: IamAction::RedisOpenClose,
        name: "Enable cluster",
    },
    Registration {
        ticket_type: TicketType::RedisInstanceClose,
        phase: ClusterPhase::Offline,
        iam: IamAction::RedisOpenClose,
        name: "Disable cluster",
    },
    Registration {
        ticket_type: TicketType::RedisInstanceOpen,
        phase: ClusterPhase::Online,
        iam: IamAction::RedisOpenClose,
        name: "Enable cluster",
    },
    Registration {
        ticket_type: TicketType::VmDisable,
        phase: ClusterPhase::Offline,
        iam: IamAction::VmEnableDisable,
        name: "Disable VM cluster",
    },
];

#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationEntry {
    pub ticket_type: TicketType,
    pub phase: ClusterPhase,
    pub iam: IamAction,
    pub name: &'static str,
    pub builder: FlowParamBuilder,
}

/// Externally visible ticket metadata.
#[derive(Clone, Debug, Serialize)]
pub struct TicketTypeInfo {
    pub ticket_type: TicketType,
    pub phase: ClusterPhase,
    pub iam_action: &'static str,
    pub name: &'static str,
    pub scene: &'static str,
    pub detail: DetailKind,
}

impl RegistrationEntry {
    pub fn info(&self) -> TicketTypeInfo {
        TicketTypeInfo {
            ticket_type: self.ticket_type,
            phase: self.phase,
            iam_action: self.iam.as_str(),
            name: self.name,
            scene: self.builder.scene.as_str(),
            detail: self.builder.detail,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BuilderRegistry {
    by_key: BTreeMap<(TicketType, ClusterPhase), RegistrationEntry>,
}

impl BuilderRegistry {
    pub fn standard() -> Result<Self, TicketError> {
        Self::from_registrations(REGISTRATIONS)
    }

    pub fn from_registrations(registrations: &[Registration]) -> Result<Self, TicketError> {
        let mut by_key = BTreeMap::new();
        for registration in registrations {
            let key = (registration.ticket_type, registration.phase);
            if by_key.contains_key(&key) {
                return Err(TicketError::DuplicateRegistration {
                    ticket_type: registration.ticket_type,
                    phase: registration.phase,
                });
            }
            by_key.insert(
                key,
                RegistrationEntry {
                    ticket_type: registration.ticket_type,
                    phase: registration.phase,
                    iam: registration.iam,
                    name: registration.name,
                    builder: FlowParamBuilder::for_ticket_type(registration.ticket_type),
                },
            );
        }
        Ok(Self { by_key })
    }

    pub fn resolve(
        &self,
        ticket_type: TicketType,
        phase: ClusterPhase,
    ) -> Result<&RegistrationEntry, TicketError> {
        self.by_key
            .get(&(ticket_type, phase))
            .ok_or(TicketError::NotRegistered { ticket_type, phase })
    }

    pub fn infer_phase(&self, ticket_type: TicketType) -> Result<ClusterPhase, TicketError> {
        let phases = self
            .by_key
            .keys()
            .filter(|(registered, _)| *registered == ticket_type)
            .map(|(_, phase)| *phase)
            .collect::<Vec<_>>();
        match phases.as_slice() {
            [phase] => Ok(*phase),
            _ => Err(TicketError::PhaseUnknown {
                ticket_type,
                registered: phases.len(),
            }),
        }
    }

    pub fn resolve_ticket(&self, ticket: &Ticket) -> Result<&RegistrationEntry, TicketError> {
        let phase = match ticket.phase {
            Some(phase) => phase,
            None => self.infer_phase(ticket.ticket_type)?,
        };
        self.resolve(ticket.ticket_type, phase)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistrationEntry> {
        self.by_key.values()
    }
}
