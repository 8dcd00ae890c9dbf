pub mod capacity_graph;
pub mod dijkstra;
