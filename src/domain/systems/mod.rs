// Per-tick simulation systems. Each one reads the live set and records its
// decisions in the world's queues (or in effect lists applied afterwards).

pub mod ai;
pub mod collision;
pub mod movement;
