use crate::common::{PumpAction, UiEvent};
use crate::connectivity::ConnectivityProbe;
use crate::display::Display;
use crate::error::ClientError;
use crate::thingspeak_client::{request_level, send_command, Endpoints, Transport};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const FETCH_ERROR: &str = "Error al obtener datos";
pub const CONNECT_ERROR: &str = "Error al conectar con ThingSpeak";
pub const EMPTY_RESPONSE: &str = "Respuesta vacía del servidor";
pub const PROCESSING_ERROR: &str = "Error al procesar datos";
pub const TANK_EMPTY: &str = "El estanque está vacío";
pub const NO_CONNECTION: &str = "Sin conexión a Internet";
pub const PUMP_ERROR: &str = "Error al controlar la bomba";
pub const COMMAND_REJECTED: &str = "Error al enviar comando";

pub fn level_text(level: &str) -> String {
    format!("Nivel de agua: {}%", level)
}

/// Polls the feed on a timer and sends pump commands.
///
/// Requests run on spawned tasks; their results come back as [`UiEvent`]s on
/// the receiver returned by [`Controller::new`] and must be handed to
/// [`Controller::handle_event`] from the loop that owns the display.
pub struct Controller<D: Display> {
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    endpoints: Arc<Endpoints>,
    events: UnboundedSender<UiEvent>,
    display: D,
    timer: Option<JoinHandle<()>>,
}

impl<D: Display> Controller<D> {
    pub fn new(
        transport: Arc<dyn Transport>,
        probe: Arc<dyn ConnectivityProbe>,
        endpoints: Endpoints,
        display: D,
    ) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, receiver) = unbounded_channel();
        let controller = Controller {
            transport,
            probe,
            endpoints: Arc::new(endpoints),
            events,
            display,
            timer: None,
        };
        (controller, receiver)
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// First poll fires right away. A slow request does not hold back the
    /// next tick, so polls may overlap.
    pub fn start_polling(&mut self, interval: Duration) {
        self.stop_polling();

        let transport = self.transport.clone();
        let endpoints = self.endpoints.clone();
        let events = self.events.clone();

        info!("start polling every {:?}", interval);
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.is_closed() {
                    warn!("ui loop gone, polling stopped");
                    break;
                }
                spawn_poll(transport.clone(), endpoints.clone(), events.clone());
            }
        }));
    }

    pub fn stop_polling(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("polling stopped");
        }
    }

    /// Poll once, outside the schedule.
    pub fn refresh(&self) {
        spawn_poll(
            self.transport.clone(),
            self.endpoints.clone(),
            self.events.clone(),
        );
    }

    pub fn send_command(&self, action: PumpAction) {
        let transport = self.transport.clone();
        let probe = self.probe.clone();
        let url = self.endpoints.command(action);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = send_command(transport.as_ref(), probe.as_ref(), &url).await;
            if let Err(e) = events.send(UiEvent::Command { action, result }) {
                warn!("send to ui loop failed ({:?})", e);
            }
        });
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Reading(Ok(level)) => {
                self.display.set_text(&level_text(&level));
                if level == "0" {
                    self.display.notify(TANK_EMPTY);
                }
            }
            UiEvent::Reading(Err(ClientError::Network(e))) => {
                error!("fetch reading failed ({})", e);
                self.display.set_text(FETCH_ERROR);
                self.display.notify(CONNECT_ERROR);
            }
            UiEvent::Reading(Err(ClientError::EmptyResponse)) => {
                warn!("fetch reading: empty response");
                self.display.set_text(EMPTY_RESPONSE);
            }
            UiEvent::Reading(Err(e)) => {
                error!("parse reading failed ({})", e);
                self.display.set_text(PROCESSING_ERROR);
            }
            UiEvent::Command { action, result } => match result {
                Ok(()) => {
                    info!("{:?} accepted", action);
                    self.display.notify(action.success_message());
                }
                Err(ClientError::Connectivity) => {
                    warn!("{:?} skipped: no connection", action);
                    self.display.notify(NO_CONNECTION);
                }
                Err(ClientError::Network(e)) => {
                    error!("{:?} failed ({})", action, e);
                    self.display.notify(PUMP_ERROR);
                }
                Err(e) => {
                    warn!("{:?} failed ({})", action, e);
                    self.display.notify(COMMAND_REJECTED);
                }
            },
        }
    }
}

impl<D: Display> Drop for Controller<D> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn spawn_poll(
    transport: Arc<dyn Transport>,
    endpoints: Arc<Endpoints>,
    events: UnboundedSender<UiEvent>,
) {
    tokio::spawn(async move {
        let result = request_level(transport.as_ref(), endpoints.feed()).await;
        if let Err(e) = events.send(UiEvent::Reading(result)) {
            warn!("send to ui loop failed ({:?})", e);
        }
    });
}
