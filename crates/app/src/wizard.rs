//! Setup/management wizard — an explicit finite state machine.
//!
//! Each state renders as a [`StepView`] (the abstract "present a form"
//! boundary) and advances by handling a [`WizardInput`]. Prompt states are
//! re-entrant: a validation failure re-enters the same prompt carrying the
//! error and whatever input is worth keeping, so the user never loses
//! forward progress. A failed learn drops back to the command-name prompt,
//! never past the device menu.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use irhub_domain::error::{IrHubError, ValidationError};
use irhub_domain::id::DeviceId;

use crate::learning::LearningCoordinator;
use crate::ports::{SnapshotStore, Transceiver};
use crate::registry::CommandRegistry;

/// Flow position, with whatever context the step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Menu,
    SelectNewDeviceBlaster,
    NameNewDevice {
        blaster: String,
        error: Option<String>,
    },
    SelectExistingDevice,
    DeviceMenu {
        device_id: DeviceId,
    },
    LearnNamePrompt {
        device_id: DeviceId,
        error: Option<String>,
    },
    LearningWait {
        device_id: DeviceId,
        command_name: String,
    },
    AddCommandPrompt {
        device_id: DeviceId,
        name: String,
        error: Option<String>,
    },
    DeleteCommandPrompt {
        device_id: DeviceId,
    },
    Done {
        message: String,
    },
}

impl WizardState {
    fn step_id(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::SelectNewDeviceBlaster => "select_new_device_blaster",
            Self::NameNewDevice { .. } => "name_new_device",
            Self::SelectExistingDevice => "select_existing_device",
            Self::DeviceMenu { .. } => "device_menu",
            Self::LearnNamePrompt { .. } => "learn_name_prompt",
            Self::LearningWait { .. } => "learning_wait",
            Self::AddCommandPrompt { .. } => "add_command_prompt",
            Self::DeleteCommandPrompt { .. } => "delete_command_prompt",
            Self::Done { .. } => "done",
        }
    }
}

/// One user input submitted against the current step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum WizardInput {
    AddNewDevice,
    ManageExistingDevice,
    ChooseBlaster { blaster: String },
    SubmitDeviceName { name: String },
    ChooseDevice { device_id: DeviceId },
    LearnCommand,
    AddCommandManually,
    DeleteCommand,
    Exit,
    SubmitCommandName { name: String },
    SubmitManualCommand { name: String, code_base64: String },
    ChooseCommandToDelete { name: String },
}

/// A selectable option presented by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Render of the current step: what to show and what can be submitted.
///
/// `prefill` carries field values retained across a failed submit so the
/// user only retypes the field in error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: String,
    pub prompt: String,
    pub fields: Vec<String>,
    pub choices: Vec<Choice>,
    pub prefill: BTreeMap<String, String>,
    pub error: Option<String>,
}

/// Flow position plus a generation counter. [`SetupWizard::reset`] bumps
/// the generation so a suspended `handle` call resuming afterwards cannot
/// overwrite the reset with its stale outcome.
struct Flow {
    generation: u64,
    state: WizardState,
}

/// Drives the multi-step setup flow against the registry and coordinator.
pub struct SetupWizard<S, T> {
    registry: Arc<CommandRegistry<S>>,
    coordinator: Arc<LearningCoordinator<S, T>>,
    transceiver: T,
    learn_timeout: Duration,
    flow: Mutex<Flow>,
}

impl<S, T> SetupWizard<S, T>
where
    S: SnapshotStore + Send + Sync,
    T: Transceiver + Send + Sync,
{
    pub fn new(
        registry: Arc<CommandRegistry<S>>,
        coordinator: Arc<LearningCoordinator<S, T>>,
        transceiver: T,
        learn_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            coordinator,
            transceiver,
            learn_timeout,
            flow: Mutex::new(Flow {
                generation: 0,
                state: WizardState::Menu,
            }),
        }
    }

    /// The current flow position.
    pub fn state(&self) -> WizardState {
        self.lock_flow().state.clone()
    }

    /// Abandon the flow and return to the menu.
    ///
    /// An in-flight learn started by this wizard is cancelled so the
    /// transceiver stops listening; when its suspended `handle` call
    /// resumes it finds the generation bumped and leaves the menu alone.
    pub fn reset(&self) {
        let mut flow = self.lock_flow();
        if matches!(flow.state, WizardState::LearningWait { .. }) {
            self.coordinator.cancel_active();
        }
        flow.generation += 1;
        flow.state = WizardState::Menu;
    }

    /// Render the current step.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self) -> Result<StepView, IrHubError> {
        let state = self.state();
        self.render(&state).await
    }

    /// Apply one input to the current step and render the next one.
    ///
    /// Validation failures re-enter the same prompt with an error instead
    /// of failing the call; only inputs that do not apply to the current
    /// step at all are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] with `UnexpectedInput` on a
    /// step/input mismatch, or registry/storage errors. Recoverable learn
    /// outcomes (timeout, cancellation, a busy slot) re-enter a prompt
    /// instead of failing the call.
    #[tracing::instrument(skip(self, input))]
    pub async fn handle(&self, input: WizardInput) -> Result<StepView, IrHubError> {
        let (generation, state) = {
            let flow = self.lock_flow();
            (flow.generation, flow.state.clone())
        };
        let next = self.transition(generation, state, input).await?;
        self.store_if_current(generation, next.clone());
        self.render(&next).await
    }

    async fn transition(
        &self,
        generation: u64,
        state: WizardState,
        input: WizardInput,
    ) -> Result<WizardState, IrHubError> {
        match (state, input) {
            (WizardState::Menu, WizardInput::AddNewDevice) => {
                Ok(WizardState::SelectNewDeviceBlaster)
            }
            (WizardState::Menu, WizardInput::ManageExistingDevice) => {
                Ok(WizardState::SelectExistingDevice)
            }
            (WizardState::SelectNewDeviceBlaster, WizardInput::ChooseBlaster { blaster }) => {
                Ok(WizardState::NameNewDevice {
                    blaster,
                    error: None,
                })
            }
            (
                WizardState::NameNewDevice { blaster, .. },
                WizardInput::SubmitDeviceName { name },
            ) => self.create_device(blaster, &name).await,
            (WizardState::SelectExistingDevice, WizardInput::ChooseDevice { device_id }) => {
                // unknown ids are caller mistakes, not flow errors
                self.registry.get_device(device_id).await?;
                Ok(WizardState::DeviceMenu { device_id })
            }
            (WizardState::DeviceMenu { device_id }, WizardInput::LearnCommand) => {
                Ok(WizardState::LearnNamePrompt {
                    device_id,
                    error: None,
                })
            }
            (WizardState::DeviceMenu { device_id }, WizardInput::AddCommandManually) => {
                Ok(WizardState::AddCommandPrompt {
                    device_id,
                    name: String::new(),
                    error: None,
                })
            }
            (WizardState::DeviceMenu { device_id }, WizardInput::DeleteCommand) => {
                Ok(WizardState::DeleteCommandPrompt { device_id })
            }
            (WizardState::DeviceMenu { .. }, WizardInput::Exit) => Ok(WizardState::Done {
                message: "done".to_string(),
            }),
            (
                WizardState::LearnNamePrompt { device_id, .. },
                WizardInput::SubmitCommandName { name },
            ) => self.learn(generation, device_id, &name).await,
            (
                WizardState::AddCommandPrompt { device_id, .. },
                WizardInput::SubmitManualCommand { name, code_base64 },
            ) => self.add_manually(device_id, name, &code_base64).await,
            (
                WizardState::DeleteCommandPrompt { device_id },
                WizardInput::ChooseCommandToDelete { name },
            ) => {
                self.registry.delete_command(device_id, &name).await?;
                Ok(WizardState::Done {
                    message: format!("command '{name}' deleted"),
                })
            }
            (
                WizardState::LearnNamePrompt { device_id, .. }
                | WizardState::AddCommandPrompt { device_id, .. }
                | WizardState::DeleteCommandPrompt { device_id },
                WizardInput::Exit,
            ) => Ok(WizardState::DeviceMenu { device_id }),
            (state, _) => Err(ValidationError::UnexpectedInput {
                step: state.step_id().to_string(),
            }
            .into()),
        }
    }

    async fn create_device(
        &self,
        blaster: String,
        name: &str,
    ) -> Result<WizardState, IrHubError> {
        match self.registry.create_device(name, &blaster).await {
            Ok(device) => Ok(WizardState::Done {
                message: format!("device '{}' created", device.name),
            }),
            Err(IrHubError::Conflict(err)) => Ok(WizardState::NameNewDevice {
                blaster,
                error: Some(err.to_string()),
            }),
            Err(IrHubError::Validation(err)) => Ok(WizardState::NameNewDevice {
                blaster,
                error: Some(err.to_string()),
            }),
            Err(err) => Err(err),
        }
    }

    async fn learn(
        &self,
        generation: u64,
        device_id: DeviceId,
        name: &str,
    ) -> Result<WizardState, IrHubError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Ok(WizardState::LearnNamePrompt {
                device_id,
                error: Some(ValidationError::EmptyName.to_string()),
            });
        }

        // Visible as "waiting" while the learn runs; cancellation arrives
        // through the coordinator and resolves the future below.
        self.store_if_current(
            generation,
            WizardState::LearningWait {
                device_id,
                command_name: name.clone(),
            },
        );

        match self
            .coordinator
            .begin_learn(device_id, &name, self.learn_timeout)
            .await
        {
            Ok(command) => Ok(WizardState::Done {
                message: format!("command '{}' learned", command.name),
            }),
            Err(IrHubError::LearnTimeout) => Ok(WizardState::LearnNamePrompt {
                device_id,
                error: Some(IrHubError::LearnTimeout.to_string()),
            }),
            Err(IrHubError::LearnCancelled) => Ok(WizardState::DeviceMenu { device_id }),
            // the slot is held by a learn started outside this flow
            Err(IrHubError::Busy(err)) => Ok(WizardState::LearnNamePrompt {
                device_id,
                error: Some(err.to_string()),
            }),
            Err(err) => {
                // no session was obtained, so the flow must not stay in
                // the waiting step
                self.store_if_current(
                    generation,
                    WizardState::LearnNamePrompt {
                        device_id,
                        error: None,
                    },
                );
                Err(err)
            }
        }
    }

    async fn add_manually(
        &self,
        device_id: DeviceId,
        name: String,
        code_base64: &str,
    ) -> Result<WizardState, IrHubError> {
        let code = match irhub_domain::code::IrCode::from_base64(code_base64) {
            Ok(code) => code,
            // keep the name so only the code has to be retyped
            Err(err) => {
                return Ok(WizardState::AddCommandPrompt {
                    device_id,
                    name,
                    error: Some(err.to_string()),
                });
            }
        };
        match self.registry.put_command(device_id, &name, code).await {
            Ok(command) => Ok(WizardState::Done {
                message: format!("command '{}' added", command.name),
            }),
            Err(IrHubError::Validation(err)) => Ok(WizardState::AddCommandPrompt {
                device_id,
                name,
                error: Some(err.to_string()),
            }),
            Err(err) => Err(err),
        }
    }

    async fn render(&self, state: &WizardState) -> Result<StepView, IrHubError> {
        let step = state.step_id().to_string();
        let view = match state {
            WizardState::Menu => StepView {
                step,
                prompt: "what do you want to do?".to_string(),
                fields: Vec::new(),
                choices: vec![
                    Choice::new("add_new_device", "Add a new device"),
                    Choice::new("manage_existing_device", "Manage an existing device"),
                ],
                prefill: BTreeMap::new(),
                error: None,
            },
            WizardState::SelectNewDeviceBlaster => StepView {
                step,
                prompt: "which blaster should the new device use?".to_string(),
                fields: Vec::new(),
                choices: self
                    .transceiver
                    .blasters()
                    .await
                    .into_iter()
                    .map(|blaster| Choice::new(blaster.clone(), blaster))
                    .collect(),
                prefill: BTreeMap::new(),
                error: None,
            },
            WizardState::NameNewDevice { error, .. } => StepView {
                step,
                prompt: "name the new device".to_string(),
                fields: vec!["name".to_string()],
                choices: Vec::new(),
                prefill: BTreeMap::new(),
                error: error.clone(),
            },
            WizardState::SelectExistingDevice => StepView {
                step,
                prompt: "which device?".to_string(),
                fields: Vec::new(),
                choices: self
                    .registry
                    .get_devices()
                    .await
                    .into_iter()
                    .map(|device| Choice::new(device.id.to_string(), device.name))
                    .collect(),
                prefill: BTreeMap::new(),
                error: None,
            },
            WizardState::DeviceMenu { device_id } => {
                let device = self.registry.get_device(*device_id).await?;
                StepView {
                    step,
                    prompt: format!("managing '{}'", device.name),
                    fields: Vec::new(),
                    choices: vec![
                        Choice::new("learn_command", "Learn a new command"),
                        Choice::new("add_command_manually", "Add a command manually"),
                        Choice::new("delete_command", "Delete a command"),
                        Choice::new("exit", "Exit"),
                    ],
                    prefill: BTreeMap::new(),
                    error: None,
                }
            }
            WizardState::LearnNamePrompt { error, .. } => StepView {
                step,
                prompt: "name the command to learn".to_string(),
                fields: vec!["name".to_string()],
                choices: Vec::new(),
                prefill: BTreeMap::new(),
                error: error.clone(),
            },
            WizardState::LearningWait { command_name, .. } => StepView {
                step,
                prompt: format!(
                    "press the button for '{command_name}' on the physical remote"
                ),
                fields: Vec::new(),
                choices: Vec::new(),
                prefill: BTreeMap::new(),
                error: None,
            },
            WizardState::AddCommandPrompt { name, error, .. } => StepView {
                step,
                prompt: "enter the command name and its base64 code".to_string(),
                fields: vec!["name".to_string(), "code_base64".to_string()],
                choices: Vec::new(),
                prefill: if name.is_empty() {
                    BTreeMap::new()
                } else {
                    BTreeMap::from([("name".to_string(), name.clone())])
                },
                error: error.clone(),
            },
            WizardState::DeleteCommandPrompt { device_id } => {
                // zero commands renders as an empty selection, not an error
                let commands = self.registry.list_commands(*device_id).await?;
                StepView {
                    step,
                    prompt: "which command should be deleted?".to_string(),
                    fields: Vec::new(),
                    choices: commands
                        .into_iter()
                        .map(|command| Choice::new(command.name.clone(), command.name))
                        .collect(),
                    prefill: BTreeMap::new(),
                    error: None,
                }
            }
            WizardState::Done { message } => StepView {
                step,
                prompt: message.clone(),
                fields: Vec::new(),
                choices: Vec::new(),
                prefill: BTreeMap::new(),
                error: None,
            },
        };
        Ok(view)
    }

    /// Like [`handle`](Self::handle), but a terminal flow restarts at the
    /// menu first, so completing one flow and starting the next needs no
    /// explicit reset.
    pub async fn handle_or_restart(&self, input: WizardInput) -> Result<StepView, IrHubError> {
        if matches!(self.state(), WizardState::Done { .. }) {
            self.reset();
        }
        self.handle(input).await
    }

    /// Write the next flow position unless a reset happened since the
    /// input was read.
    fn store_if_current(&self, generation: u64, next: WizardState) {
        let mut flow = self.lock_flow();
        if flow.generation == generation {
            flow.state = next;
        }
    }

    fn lock_flow(&self) -> MutexGuard<'_, Flow> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
