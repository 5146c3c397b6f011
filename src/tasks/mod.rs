pub mod beep_task;
pub mod button_task;
pub mod nmea_task;
pub mod power_task;
#[cfg(not(feature = "simulator"))]
pub mod sensor_task;
#[cfg(not(feature = "simulator"))]
pub mod signal_task;
#[cfg(feature = "simulator")]
pub mod sim_task;
