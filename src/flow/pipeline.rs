use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::{FlowController, Scene, generate_root_id};
use crate::ticket::{BuilderRegistry, FlowParams, RegistrationEntry, Ticket, TicketError};

/// Result of a ticket submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Submission {
    pub root_id: String,
    pub scene: Scene,
    pub params: FlowParams,
}

/// Validate, build and launch tickets against a fixed registry.
pub struct TicketPipeline<C> {
    registry: BuilderRegistry,
    controller: C,
}

impl<C: FlowController> TicketPipeline<C> {
    pub fn new(registry: BuilderRegistry, controller: C) -> Self {
        Self {
            registry,
            controller,
        }
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn build(&self, ticket: &Ticket) -> Result<(&RegistrationEntry, FlowParams), TicketError> {
        let entry = self.registry.resolve_ticket(ticket)?;
        let params = entry.builder.build(ticket).inspect_err(|err| {
            warn!(uid = ticket.uid, ticket_type = %ticket.ticket_type, error = %err, "ticket rejected");
        })?;
        Ok((entry, params))
    }

    pub fn submit(&self, ticket: &Ticket) -> Result<Submission, TicketError> {
        let (entry, params) = self.build(ticket)?;
        let scene = entry.builder.scene;
        let ticket_data = params.to_ticket_data().map_err(|source| TicketError::Launch {
            root_id: String::new(),
            source,
        })?;
        let root_id = self.launch_scene(scene, &ticket_data)?;
        info!(
            root_id = %root_id,
            uid = ticket.uid,
            ticket_type = %ticket.ticket_type,
            phase = %entry.phase,
            "ticket submitted"
        );
        Ok(Submission {
            root_id,
            scene,
            params,
        })
    }

    /// Launch `scene` with caller-prepared data, bypassing ticket building.
    pub fn launch_scene(&self, scene: Scene, ticket_data: &JsonValue) -> Result<String, TicketError> {
        let root_id = generate_root_id();
        info!(root_id = %root_id, scene = %scene, "define root_id");
        self.controller
            .launch(scene, &root_id, ticket_data)
            .map_err(|source| TicketError::Launch {
                root_id: root_id.clone(),
                source,
            })?;
        Ok(root_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::ticket::{ClusterPhase, TicketType};

    #[derive(Default)]
    struct RecordingController {
        launches: Mutex<Vec<(Scene, String, JsonValue)>>,
    }

    impl FlowController for RecordingController {
        fn launch(
            &self,
            scene: Scene,
            root_id: &str,
            ticket_data: &JsonValue,
        ) -> anyhow::Result<()> {
            self.launches
                .lock()
                .expect("launches lock")
                .push((scene, root_id.to_string(), ticket_data.clone()));
            Ok(())
        }
    }

    struct FailingController;

    impl FlowController for FailingController {
        fn launch(&self, _: Scene, _: &str, _: &JsonValue) -> anyhow::Result<()> {
            anyhow::bail!("engine unavailable")
        }
    }

    fn proxy_close(force: bool) -> Ticket {
        Ticket {
            uid: 340,
            ticket_type: TicketType::RedisProxyClose,
            bk_biz_id: 3,
            created_by: "admin".to_string(),
            remark: None,
            phase: None,
            details: json!({"cluster_id": 1111, "force": force}),
        }
    }

    #[test]
    fn submit_launches_resolved_scene_with_built_params() {
        let pipeline = TicketPipeline::new(
            BuilderRegistry::standard().unwrap(),
            RecordingController::default(),
        );
        let submission = pipeline.submit(&proxy_close(false)).unwrap();
        assert_eq!(submission.scene, Scene::RedisClusterOpenClose);

        let launches = pipeline.controller().launches.lock().unwrap();
        assert_eq!(launches.len(), 1);
        let (scene, root_id, data) = &launches[0];
        assert_eq!(*scene, Scene::RedisClusterOpenClose);
        assert_eq!(root_id, &submission.root_id);
        assert_eq!(data["force"], json!(true));
        assert_eq!(data["cluster_id"], json!(1111));
    }

    #[test]
    fn wrong_phase_never_reaches_controller() {
        let pipeline = TicketPipeline::new(
            BuilderRegistry::standard().unwrap(),
            RecordingController::default(),
        );
        let mut ticket = proxy_close(true);
        ticket.phase = Some(ClusterPhase::Online);
        let err = pipeline.submit(&ticket).unwrap_err();
        assert!(matches!(err, TicketError::NotRegistered { .. }));
        assert!(pipeline.controller().launches.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_ticket_never_reaches_controller() {
        let pipeline = TicketPipeline::new(
            BuilderRegistry::standard().unwrap(),
            RecordingController::default(),
        );
        let mut ticket = proxy_close(true);
        ticket.details = json!({"force": true});
        assert!(matches!(
            pipeline.submit(&ticket),
            Err(TicketError::Validation { .. })
        ));
        assert!(pipeline.controller().launches.lock().unwrap().is_empty());
    }

    #[test]
    fn controller_failure_surfaces_as_launch_error() {
        let pipeline = TicketPipeline::new(BuilderRegistry::standard().unwrap(), FailingController);
        match pipeline.submit(&proxy_close(false)) {
            Err(TicketError::Launch { root_id, source }) => {
                assert!(!root_id.is_empty());
                assert!(source.to_string().contains("engine unavailable"));
            }
            other => panic!("expected launch error, got {other:?}"),
        }
    }
}
