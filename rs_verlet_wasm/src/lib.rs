// rs_verlet_wasm/src/lib.rs
// JavaScript bindings for the particle simulation.

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;
use web_sys::console;
use rs_verlet::models::Vector3D;
use rs_verlet::particles::Simulation;
use rs_verlet::utils::SimulationConfig;

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
pub struct WasmSimulation {
    simulation: Simulation,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Creates a simulation over the cube `±world_extent` with the default tuning.
    #[wasm_bindgen(constructor)]
    pub fn new(world_extent: f64, max_particles: usize) -> Result<WasmSimulation, JsValue> {
        let config = SimulationConfig::new(Some(world_extent), None, None, None, Some(max_particles));
        Simulation::new(config)
            .map(|simulation| WasmSimulation { simulation })
            .map_err(to_js)
    }

    /// Returns the new particle's id, or `undefined` when the simulation is full.
    #[wasm_bindgen]
    pub fn spawn(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        vx: f64,
        vy: f64,
        vz: f64,
        radius: f64,
        mass: f64,
    ) -> Result<Option<usize>, JsValue> {
        self.simulation
            .spawn(Vector3D::new(x, y, z), Vector3D::new(vx, vy, vz), radius, mass)
            .map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn step(&mut self, frame_dt: f64, substeps: u32) -> Result<(), JsValue> {
        self.simulation.step(frame_dt, substeps).map_err(to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn particle_count(&self) -> usize {
        self.simulation.particle_count()
    }

    #[wasm_bindgen]
    pub fn apply_point_force(&mut self, x: f64, y: f64, z: f64, radius: f64) -> usize {
        self.simulation.apply_point_force(Vector3D::new(x, y, z), radius)
    }

    /// Flat `[x0, y0, z0, x1, y1, z1, ...]` buffer for rendering.
    #[wasm_bindgen]
    pub fn positions(&self) -> Float64Array {
        let buffer: Vec<f64> = self
            .simulation
            .positions()
            .into_iter()
            .flat_map(|position| [position.x, position.y, position.z])
            .collect();
        Float64Array::from(&buffer[..])
    }

    #[wasm_bindgen]
    pub fn shutdown(&mut self) {
        let released = self.simulation.particle_count();
        self.simulation.shutdown();
        console::log_1(&JsValue::from_str(&format!("simulation shut down, {} particles released", released)));
    }
}
