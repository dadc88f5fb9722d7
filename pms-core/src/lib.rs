#![no_std]

// Control core for the solar-car power management system.
//
// Everything here is portable between the STM32 firmware and host tooling:
// hardware is reached only through the collaborator traits in `can` and `io`,
// and interrupt-shared state lives in the atomic cells of `capture` and
// `timing`.

pub mod actuators;
pub mod can;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod events;
pub mod io;
pub mod machine;
pub mod safety;
pub mod sequences;
pub mod telemetry;
pub mod timing;
