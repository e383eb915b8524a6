pub mod accumulator;
pub mod cell_grid;
pub mod context;
pub mod elements;
pub mod histogram;
pub mod materials;
pub mod position_map;
pub mod scan;
pub mod track;
